use clap::Parser;
use instaparse_site::cli::args::{Args, Command};
use instaparse_site::client::CodegenClient;
use instaparse_site::codegen::{InstaparseCompiler, Language, SourceGenerator};
use instaparse_site::config::{ConfigManager, ConfigSource, SiteConfig};
use instaparse_site::editor::{EditorSession, GenerationOutcome, SessionHistory};
use instaparse_site::infrastructure::{setup_logging, LoggingConfig};
use instaparse_site::server;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn load_config(args: &Args) -> anyhow::Result<SiteConfig> {
    let mut manager = ConfigManager::new();
    if let Some(path) = &args.config {
        manager = manager.add_source(ConfigSource::File(path.clone()));
    }
    let mut manager = manager
        .add_source(ConfigSource::Environment)
        .add_source(ConfigSource::CommandLine(args.config_overrides()));

    manager.load()?;
    Ok(manager.into_config())
}

/// 本地运行编译器，把生成的文件写到输出文件所在目录
async fn handle_generate(
    config: &SiteConfig,
    format_file: &Path,
    language: Option<&str>,
    output: &str,
) -> anyhow::Result<()> {
    let language = match language {
        Some(name) => name.parse::<Language>()?,
        None => Language::infer_from_output(output)
            .ok_or_else(|| anyhow::anyhow!("language not supported."))?,
    };

    let output_path = PathBuf::from(output);
    let out_dir = output_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let main_name = output_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(config.compiler.main_name.as_str())
        .to_string();

    let input = tokio::fs::read_to_string(format_file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", format_file.display(), e))?;

    let compiler = InstaparseCompiler::from_config(&config.compiler).with_main_name(main_name);
    let result = compiler.generate(language, &input).await?.decoded()?;

    tokio::fs::create_dir_all(&out_dir).await?;
    for file in result.files() {
        let path = out_dir.join(&file.name);
        tokio::fs::write(&path, &file.content).await?;
        println!("✓ {}", path.display());
    }

    Ok(())
}

/// 通过站点的 /gencode 生成代码并保存 parser.zip
async fn handle_fetch(format_file: &Path, server_url: &str, language: &str, dest: &Path) -> anyhow::Result<()> {
    let language = language.parse::<Language>()?;
    let source = tokio::fs::read_to_string(format_file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", format_file.display(), e))?;

    let mut session = EditorSession::new(SessionHistory::new(), Arc::new(CodegenClient::new(server_url)));
    session.set_language(language);
    session.set_source(source);

    match session.compile().await {
        GenerationOutcome::Applied { .. } => {
            for (name, _) in session.tabs().files() {
                println!("  {}", name);
            }
            let path = session.download_output()?.save_to(dest)?;
            println!("✓ Saved {}", path.display());
            Ok(())
        }
        GenerationOutcome::Failed(failure) => anyhow::bail!("{}", failure),
        GenerationOutcome::Stale { .. } => anyhow::bail!("generation response was superseded"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let logging = LoggingConfig::from_settings(
        &config.logging.level,
        &config.logging.format,
        config.logging.file.as_deref(),
    )?;
    setup_logging(logging)?;

    match args.command() {
        Command::Serve(_) => server::run(&config).await,
        Command::Generate { format_file, language, output } => {
            handle_generate(&config, &format_file, language.as_deref(), &output).await
        }
        Command::Fetch { format_file, server, language, dest } => {
            handle_fetch(&format_file, &server, &language, &dest).await
        }
    }
}

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "instaparse-site",
    version,
    about = "InstaParse documentation site and parser generation service",
    long_about = "Serves the InstaParse documentation with its embedded editor, forwards format specifications to the instaparse compiler, and can drive the generation endpoint from the command line."
)]
pub struct Args {
    /// TOML 配置文件
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// 启动文档站点（默认）
    Serve(ServeArgs),

    /// Run the instaparse compiler locally and write the generated sources
    Generate {
        /// Format specification file
        format_file: PathBuf,

        /// Output language (python, java, c++); inferred from --output when omitted
        #[arg(short = 'l', long = "lang")]
        language: Option<String>,

        /// Output file name; its directory receives every generated file
        #[arg(short, long, default_value = "out")]
        output: String,
    },

    /// 调用运行中的站点生成代码并保存 parser.zip
    Fetch {
        /// Format specification file
        format_file: PathBuf,

        #[arg(short, long, default_value = "http://localhost:8000")]
        server: String,

        #[arg(short = 'l', long = "lang", default_value = "python")]
        language: String,

        /// Directory that receives parser.zip
        #[arg(short, long, default_value = ".")]
        dest: PathBuf,
    },
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    #[arg(long, value_name = "DIR")]
    pub content_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub public_dir: Option<PathBuf>,

    /// development or production
    #[arg(long)]
    pub environment: Option<String>,

    #[arg(long)]
    pub compiler_command: Option<String>,

    #[arg(long, value_name = "FILE")]
    pub compiler_script: Option<PathBuf>,
}

impl Args {
    /// 子命令缺省时按 serve 处理
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }

    /// 转换为配置管理器使用的命令行覆盖项
    pub fn config_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();

        if let Some(level) = &self.log_level {
            overrides.insert("log-level".to_string(), level.clone());
        }

        if let Some(Command::Serve(serve)) = &self.command {
            if let Some(host) = &serve.host {
                overrides.insert("host".to_string(), host.clone());
            }
            if let Some(port) = serve.port {
                overrides.insert("port".to_string(), port.to_string());
            }
            if let Some(dir) = &serve.content_dir {
                overrides.insert("content-dir".to_string(), dir.display().to_string());
            }
            if let Some(dir) = &serve.public_dir {
                overrides.insert("public-dir".to_string(), dir.display().to_string());
            }
            if let Some(environment) = &serve.environment {
                overrides.insert("environment".to_string(), environment.clone());
            }
            if let Some(command) = &serve.compiler_command {
                overrides.insert("compiler-command".to_string(), command.clone());
            }
            if let Some(script) = &serve.compiler_script {
                overrides.insert("compiler-script".to_string(), script.display().to_string());
            }
        }

        overrides
    }
}

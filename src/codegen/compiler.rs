use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{collect_sources, GenerationResult, Language};
use crate::config::CompilerConfig;
use crate::infrastructure::error::SiteError;

const FORMAT_FILE_NAME: &str = "format.instaparse";

/// 把格式描述编译成目标语言源码的后端
#[async_trait]
pub trait SourceGenerator: Send + Sync {
    async fn generate(&self, language: Language, input: &str) -> Result<GenerationResult, SiteError>;
}

/// 以子进程方式调用 instaparse 编译器
#[derive(Debug, Clone)]
pub struct InstaparseCompiler {
    command: String,
    script: PathBuf,
    main_name: String,
    timeout: Duration,
}

impl InstaparseCompiler {
    pub fn new(command: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        let defaults = CompilerConfig::default();
        Self {
            command: command.into(),
            script: script.into(),
            main_name: defaults.main_name,
            timeout: Duration::from_secs(defaults.timeout_seconds),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            command: config.command.clone(),
            script: config.script.clone(),
            main_name: config.main_name.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_main_name(mut self, main_name: impl Into<String>) -> Self {
        self.main_name = main_name.into();
        self
    }

    async fn run_compiler(&self, language: Language, work_dir: &Path) -> Result<(), SiteError> {
        let format_path = work_dir.join(FORMAT_FILE_NAME);
        let output_path = work_dir.join(&self.main_name);

        let mut command = Command::new(&self.command);
        command
            .arg(&self.script)
            .args(["-l", language.as_str(), "-o"])
            .arg(&output_path)
            .arg(&format_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(command = %self.command, script = %self.script.display(), %language, "Running instaparse");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SiteError::timeout("instaparse", self.timeout.as_secs()))?
            .map_err(|e| SiteError::compiler(format!("Failed to run {}: {}", self.command, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            return Err(SiteError::compiler(stderr));
        }

        if !output.status.success() {
            // instaparse 把解析失败信息打印到 stdout
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if stdout.is_empty() {
                format!("instaparse exited with code {:?}", output.status.code())
            } else {
                stdout
            };
            return Err(SiteError::compiler(message));
        }

        Ok(())
    }
}

#[async_trait]
impl SourceGenerator for InstaparseCompiler {
    async fn generate(&self, language: Language, input: &str) -> Result<GenerationResult, SiteError> {
        // 目录在离开作用域时删除
        let work_dir = tempfile::Builder::new()
            .prefix("instaparse-")
            .tempdir()
            .map_err(|e| SiteError::file_system(format!("Unable to create work dir: {}", e), None))?;

        tokio::fs::write(work_dir.path().join(FORMAT_FILE_NAME), input).await?;
        self.run_compiler(language, work_dir.path()).await?;

        let result = collect_sources(work_dir.path(), FORMAT_FILE_NAME, &self.main_name).await?;
        tracing::info!(%language, files = result.file_count(), "Generated parser sources");

        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::codegen::GenerationPayload;
    use tempfile::TempDir;

    /// 写一个模拟 instaparse 的 shell 脚本；参数为 -l LANG -o OUT FORMAT
    fn fake_compiler(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("fake_instaparse.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_generate_python() {
        let scripts = TempDir::new().unwrap();
        let script = fake_compiler(
            &scripts,
            r#"out="$4"; dir=$(dirname "$out")
printf 'lang=%s\n' "$2" > "$out.py"
cat "$5" >> "$out.py"
printf 'util\n' > "$dir/InstaParseUtil.py"
printf 'data\n' > "$dir/InstaParseData.py""#,
        );

        let compiler = InstaparseCompiler::new("sh", script);
        let result = compiler.generate(Language::Python, "<head>\n").await.unwrap();
        let decoded = result.decoded().unwrap();

        assert_eq!(decoded.main.name, "Main.py");
        assert_eq!(decoded.main.content, "lang=python\n<head>\n");
        assert_eq!(decoded.util.content, "util\n");
        assert!(matches!(decoded.payload, GenerationPayload::Data(_)));
    }

    #[tokio::test]
    async fn test_generate_java_classes() {
        let scripts = TempDir::new().unwrap();
        let script = fake_compiler(
            &scripts,
            r#"out="$4"; dir=$(dirname "$out")
: > "$out.java"
: > "$dir/InstaParseUtil.java"
: > "$dir/Point.java"
: > "$dir/Line.java""#,
        );

        let compiler = InstaparseCompiler::new("sh", script);
        let result = compiler.generate(Language::Java, "").await.unwrap();
        match result.payload {
            GenerationPayload::Classes(files) => {
                let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["Line.java", "Point.java"]);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stderr_is_reported() {
        let scripts = TempDir::new().unwrap();
        let script = fake_compiler(&scripts, "echo 'line 3: unknown type' >&2");

        let compiler = InstaparseCompiler::new("sh", script);
        let err = compiler.generate(Language::Python, "bad").await.unwrap_err();
        assert!(matches!(err, SiteError::Compiler { ref message } if message == "line 3: unknown type"));
    }

    #[tokio::test]
    async fn test_failed_exit_uses_stdout() {
        let scripts = TempDir::new().unwrap();
        let script = fake_compiler(&scripts, "echo 'Parse failed'\nexit 1");

        let compiler = InstaparseCompiler::new("sh", script);
        let err = compiler.generate(Language::Python, "bad").await.unwrap_err();
        assert!(err.to_string().contains("Parse failed"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let scripts = TempDir::new().unwrap();
        let script = fake_compiler(&scripts, "sleep 5");

        let compiler = InstaparseCompiler::new("sh", script).with_timeout(Duration::from_millis(100));
        let err = compiler.generate(Language::Python, "").await.unwrap_err();
        assert!(matches!(err, SiteError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let compiler = InstaparseCompiler::new("/nonexistent/python", "instaparse.py");
        let err = compiler.generate(Language::Python, "").await.unwrap_err();
        assert!(matches!(err, SiteError::Compiler { .. }));
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::infrastructure::error::SiteError;

/// 站点配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// 基础配置
    pub general: GeneralConfig,

    /// HTTP 服务配置
    pub server: ServerConfig,

    /// 代码生成器配置
    pub compiler: CompilerConfig,

    /// 日志配置
    pub logging: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    pub environment: Environment,
}

/// 运行环境，决定错误页是否展示错误详情
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 文档内容目录（order.json、languages.json 及各章节文件）
    pub content_dir: PathBuf,
    /// 静态资源目录
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// 解释器命令，例如 python
    pub command: String,
    /// instaparse 脚本路径
    pub script: PathBuf,
    /// 主文件名（不含扩展名）
    pub main_name: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "InstaParse".to_string(),
            environment: Environment::Development,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            content_dir: PathBuf::from("content"),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: "python".to_string(),
            script: PathBuf::from("instaparse.py"),
            main_name: "Main".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// 配置源
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Default,
    File(PathBuf),
    Environment,
    CommandLine(HashMap<String, String>),
}

/// 配置管理器，按添加顺序加载配置源，后加载的覆盖先加载的
pub struct ConfigManager {
    config: SiteConfig,
    config_sources: Vec<ConfigSource>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: SiteConfig::default(),
            config_sources: vec![ConfigSource::Default],
        }
    }

    /// 添加配置源
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.config_sources.push(source);
        self
    }

    /// 加载配置
    pub fn load(&mut self) -> Result<(), SiteError> {
        let mut config = SiteConfig::default();

        for source in &self.config_sources {
            match source {
                ConfigSource::File(path) => {
                    self.load_from_file(&mut config, path)?;
                }
                ConfigSource::Environment => {
                    // 先加载 .env，环境变量中已有的值不会被覆盖
                    #[cfg(not(test))]
                    dotenvy::dotenv().ok();
                    apply_environment(&mut config, |key| env::var(key).ok())?;
                }
                ConfigSource::CommandLine(args) => {
                    apply_command_line(&mut config, args)?;
                }
                ConfigSource::Default => {}
            }
        }

        validate_config(&config)?;
        self.config = config;

        Ok(())
    }

    fn load_from_file(&self, config: &mut SiteConfig, path: &PathBuf) -> Result<(), SiteError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, skipping");
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SiteError::file_system(
                format!("Unable to read config file: {}", e),
                Some(path.to_string_lossy().to_string()),
            )
        })?;

        *config = toml::from_str(&content)
            .map_err(|e| SiteError::config(format!("TOML parse error: {}", e)))?;

        Ok(())
    }

    pub fn get_config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn into_config(self) -> SiteConfig {
        self.config
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 从环境变量覆盖配置
pub fn apply_environment<F>(config: &mut SiteConfig, lookup: F) -> Result<(), SiteError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("INSTAPARSE_ENV") {
        config.general.environment = Environment::parse(&value)
            .ok_or_else(|| SiteError::config(format!("Unknown environment: {}", value)))?;
    }
    if let Some(host) = lookup("INSTAPARSE_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("INSTAPARSE_PORT") {
        config.server.port = parse_number(&port, "INSTAPARSE_PORT")?;
    }
    if let Some(dir) = lookup("INSTAPARSE_CONTENT_DIR") {
        config.server.content_dir = PathBuf::from(dir);
    }
    if let Some(dir) = lookup("INSTAPARSE_PUBLIC_DIR") {
        config.server.public_dir = PathBuf::from(dir);
    }
    if let Some(command) = lookup("INSTAPARSE_COMPILER_COMMAND") {
        config.compiler.command = command;
    }
    if let Some(script) = lookup("INSTAPARSE_COMPILER_SCRIPT") {
        config.compiler.script = PathBuf::from(script);
    }
    if let Some(timeout) = lookup("INSTAPARSE_COMPILER_TIMEOUT") {
        config.compiler.timeout_seconds = parse_number(&timeout, "INSTAPARSE_COMPILER_TIMEOUT")?;
    }
    if let Some(level) = lookup("INSTAPARSE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = lookup("INSTAPARSE_LOG_FORMAT") {
        config.logging.format = format;
    }
    if let Some(file) = lookup("INSTAPARSE_LOG_FILE") {
        config.logging.file = Some(file);
    }

    Ok(())
}

/// 命令行参数优先级最高
fn apply_command_line(config: &mut SiteConfig, args: &HashMap<String, String>) -> Result<(), SiteError> {
    for (key, value) in args {
        match key.as_str() {
            "host" => config.server.host = value.clone(),
            "port" => config.server.port = parse_number(value, "--port")?,
            "content-dir" => config.server.content_dir = PathBuf::from(value),
            "public-dir" => config.server.public_dir = PathBuf::from(value),
            "compiler-command" => config.compiler.command = value.clone(),
            "compiler-script" => config.compiler.script = PathBuf::from(value),
            "log-level" => config.logging.level = value.clone(),
            "environment" => {
                config.general.environment = Environment::parse(value)
                    .ok_or_else(|| SiteError::config(format!("Unknown environment: {}", value)))?;
            }
            _ => {
                tracing::debug!(key = %key, "Ignoring unknown command line setting");
            }
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, SiteError> {
    value
        .trim()
        .parse()
        .map_err(|_| SiteError::config(format!("{} must be a number, got '{}'", name, value)))
}

fn validate_config(config: &SiteConfig) -> Result<(), SiteError> {
    if config.server.port == 0 {
        return Err(SiteError::config("server.port must be non-zero"));
    }
    if config.compiler.timeout_seconds == 0 {
        return Err(SiteError::config("compiler.timeout_seconds must be non-zero"));
    }
    if config.server.content_dir.as_os_str().is_empty() {
        return Err(SiteError::config("server.content_dir must be set"));
    }
    if config.compiler.main_name.trim().is_empty() {
        return Err(SiteError::config("compiler.main_name must be set"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.general.title, "InstaParse");
        assert_eq!(config.general.environment, Environment::Development);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.compiler.command, "python");
        assert_eq!(config.compiler.main_name, "Main");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_config_from_env() {
        let mut config = SiteConfig::default();
        let lookup = lookup_from(&[
            ("INSTAPARSE_PORT", "9090"),
            ("INSTAPARSE_ENV", "production"),
            ("INSTAPARSE_COMPILER_SCRIPT", "/opt/instaparse/instaparse.py"),
            ("INSTAPARSE_LOG_LEVEL", "debug"),
        ]);

        apply_environment(&mut config, lookup).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.general.environment, Environment::Production);
        assert_eq!(config.compiler.script, PathBuf::from("/opt/instaparse/instaparse.py"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_from_env_rejects_bad_port() {
        let mut config = SiteConfig::default();
        let result = apply_environment(&mut config, lookup_from(&[("INSTAPARSE_PORT", "eighty")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_then_command_line() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 3000\ncontent_dir = \"docs\"\n\n[compiler]\ntimeout_seconds = 5"
        )
        .unwrap();

        let mut args = HashMap::new();
        args.insert("port".to_string(), "4000".to_string());

        let mut manager = ConfigManager::new()
            .add_source(ConfigSource::File(file.path().to_path_buf()))
            .add_source(ConfigSource::CommandLine(args));
        manager.load().unwrap();

        let config = manager.get_config();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.content_dir, PathBuf::from("docs"));
        assert_eq!(config.compiler.timeout_seconds, 5);
        // 未在文件中出现的字段保持默认值
        assert_eq!(config.compiler.command, "python");
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let mut manager = ConfigManager::new()
            .add_source(ConfigSource::File(PathBuf::from("/nonexistent/site.toml")));
        assert!(manager.load().is_ok());
        assert_eq!(manager.get_config().server.port, 8000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SiteConfig::default();
        config.compiler.timeout_seconds = 0;
        assert!(validate_config(&config).is_err());

        let mut config = SiteConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }
}

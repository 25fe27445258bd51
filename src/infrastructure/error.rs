use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 站点错误类型
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SiteError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("file system error: {message}")]
    FileSystem { message: String, path: Option<String> },

    #[error("content error: {message}")]
    Content { message: String, file: String },

    #[error("template error: {message}")]
    Template { message: String },

    #[error("language not supported: {language}")]
    UnsupportedLanguage { language: String },

    #[error("compiler error: {message}")]
    Compiler { message: String },

    #[error("{operation} timed out ({timeout_seconds}s)")]
    Timeout { operation: String, timeout_seconds: u64 },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("archive error: {message}")]
    Archive { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SiteError {
    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            SiteError::Configuration { .. } => ErrorCategory::Configuration,
            SiteError::FileSystem { .. } => ErrorCategory::IO,
            SiteError::Content { .. } => ErrorCategory::Data,
            SiteError::Template { .. } => ErrorCategory::Internal,
            SiteError::UnsupportedLanguage { .. } => ErrorCategory::Request,
            SiteError::Compiler { .. } => ErrorCategory::ExternalService,
            SiteError::Timeout { .. } => ErrorCategory::ExternalService,
            SiteError::NotFound { .. } => ErrorCategory::Request,
            SiteError::Archive { .. } => ErrorCategory::IO,
            SiteError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            SiteError::NotFound { .. } => 404,
            SiteError::UnsupportedLanguage { .. } => 400,
            SiteError::Timeout { .. } => 504,
            SiteError::Compiler { .. } => 502,
            _ => 500,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SiteError::Configuration {
            message: message.into(),
        }
    }

    pub fn file_system(message: impl Into<String>, path: Option<String>) -> Self {
        SiteError::FileSystem {
            message: message.into(),
            path,
        }
    }

    pub fn content(message: impl Into<String>, file: impl Into<String>) -> Self {
        SiteError::Content {
            message: message.into(),
            file: file.into(),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        SiteError::Template {
            message: message.into(),
        }
    }

    pub fn unsupported_language(language: impl Into<String>) -> Self {
        SiteError::UnsupportedLanguage {
            language: language.into(),
        }
    }

    pub fn compiler(message: impl Into<String>) -> Self {
        SiteError::Compiler {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_seconds: u64) -> Self {
        SiteError::Timeout {
            operation: operation.into(),
            timeout_seconds,
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        SiteError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn archive(message: impl Into<String>) -> Self {
        SiteError::Archive {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        SiteError::Internal {
            message: message.into(),
        }
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    Configuration,
    IO,
    Data,
    Request,
    ExternalService,
    Internal,
}

impl From<std::io::Error> for SiteError {
    fn from(err: std::io::Error) -> Self {
        SiteError::file_system(err.to_string(), None)
    }
}

impl From<handlebars::RenderError> for SiteError {
    fn from(err: handlebars::RenderError) -> Self {
        SiteError::template(err.to_string())
    }
}

impl From<zip::result::ZipError> for SiteError {
    fn from(err: zip::result::ZipError) -> Self {
        SiteError::archive(err.to_string())
    }
}

pub type SiteResult<T> = Result<T, SiteError>;

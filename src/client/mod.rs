//! `/gencode` 的 HTTP 客户端。

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::codegen::encoding::encode_query_component;
use crate::codegen::{GencodeResponse, GenerationResult, Language};

/// 代码生成失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// 服务返回了 `error` 字段
    #[error("generation failed: {0}")]
    Service(String),

    #[error("transport error{}: {message}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    Transport { status: Option<u16>, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// 代码生成服务
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, language: Language, source: &str) -> Result<GenerationResult, GenerationFailure>;
}

/// 通过 HTTP 调用 `/gencode`
#[derive(Debug, Clone)]
pub struct CodegenClient {
    client: reqwest::Client,
    endpoint: String,
}

impl CodegenClient {
    /// `base_url` 是站点根地址，例如 `http://localhost:8000`
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/gencode", base_url.trim_end_matches('/')),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GenerationFailure> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationFailure::Transport {
                status: None,
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 构造请求 URL
    pub fn request_url(&self, language: Language, source: &str) -> String {
        format!(
            "{}?language={}&input={}",
            self.endpoint,
            encode_query_component(language.as_str()),
            encode_query_component(source)
        )
    }
}

#[async_trait]
impl GenerationService for CodegenClient {
    async fn generate(&self, language: Language, source: &str) -> Result<GenerationResult, GenerationFailure> {
        tracing::debug!(%language, bytes = source.len(), "Calling gencode");

        let response = self
            .client
            .get(self.request_url(language, source))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error generating code (no response)");
                GenerationFailure::Transport {
                    status: e.status().map(|s| s.as_u16()),
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Error generating code");
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationFailure::Transport {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let body = response.text().await.map_err(|e| GenerationFailure::Transport {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        let parsed: GencodeResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Malformed gencode response");
            GenerationFailure::Malformed(e.to_string())
        })?;

        parsed.into_result().map_err(|error| {
            tracing::error!(%error, "Code generation reported an error");
            GenerationFailure::Service(error)
        })
    }
}

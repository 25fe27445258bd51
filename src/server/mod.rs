//! HTTP 服务：文档页、`/gencode` 以及 public 目录下的静态资源。

pub mod routes;
pub mod static_files;
pub mod templates;

use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::codegen::{InstaparseCompiler, SourceGenerator};
use crate::config::{Environment, SiteConfig};
use crate::content::SiteContent;
use crate::infrastructure::error::SiteError;
use templates::TemplateEngine;

/// 所有请求共享的只读状态
pub struct AppState {
    pub title: String,
    pub environment: Environment,
    pub content: SiteContent,
    pub public_dir: PathBuf,
    pub templates: TemplateEngine,
    pub generator: Arc<dyn SourceGenerator>,
}

impl AppState {
    pub fn new(
        config: &SiteConfig,
        content: SiteContent,
        generator: Arc<dyn SourceGenerator>,
    ) -> Result<Self, SiteError> {
        Ok(Self {
            title: config.general.title.clone(),
            environment: config.general.environment,
            content,
            public_dir: config.server.public_dir.clone(),
            templates: TemplateEngine::new()?,
            generator,
        })
    }

    /// 按配置加载内容并使用 instaparse 子进程作为生成后端
    pub fn from_config(config: &SiteConfig) -> Result<Self, SiteError> {
        let content = SiteContent::load(&config.server.content_dir)?;
        let generator = Arc::new(InstaparseCompiler::from_config(&config.compiler));
        Self::new(config, content, generator)
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/editor", get(routes::index))
        .route("/gencode", get(routes::gencode))
        .fallback(routes::static_asset)
        .layer(middleware::from_fn(routes::log_requests))
        .with_state(state)
}

/// 在已绑定的监听器上运行服务
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "InstaParse site listening");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

pub async fn run(config: &SiteConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    serve(listener, state).await
}

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use super::{static_files, AppState};
use crate::codegen::{GencodeResponse, Language};
use crate::config::Environment;
use crate::infrastructure::error::SiteError;

#[derive(Debug, Deserialize)]
pub struct GencodeQuery {
    pub language: Option<String>,
    pub input: Option<String>,
}

/// `/` 与 `/editor` 返回同一页面
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match state.templates.render_index(&state.title, &state.content) {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_page(&state, &e),
    }
}

/// 生成接口：错误也以 `{"error": ...}` 的 JSON 返回
pub async fn gencode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GencodeQuery>,
) -> Json<GencodeResponse> {
    let language = match query.language.as_deref().unwrap_or("").parse::<Language>() {
        Ok(language) => language,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected generation request");
            return Json(GencodeResponse::Failure {
                error: "language not supported.".to_string(),
            });
        }
    };
    let input = query.input.unwrap_or_default();

    match state.generator.generate(language, &input).await {
        Ok(result) => Json(GencodeResponse::Success(result)),
        Err(e) => {
            tracing::error!(%language, error = %e, "Code generation failed");
            let error = match e {
                SiteError::Compiler { message } => message,
                other => other.to_string(),
            };
            Json(GencodeResponse::Failure { error })
        }
    }
}

pub async fn static_asset(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    match static_files::load(&state.public_dir, uri.path()).await {
        Ok(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        Err(e) => error_page(&state, &e),
    }
}

/// 渲染错误页；生产环境不暴露错误详情
pub fn error_page(state: &AppState, error: &SiteError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = status.canonical_reason().unwrap_or("Error");
    let detail = error.to_string();
    let detail = match state.environment {
        Environment::Development => Some(detail.as_str()),
        Environment::Production => None,
    };

    match state.templates.render_error(status.as_u16(), message, detail) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render error page");
            (status, message.to_string()).into_response()
        }
    }
}

/// 请求日志
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

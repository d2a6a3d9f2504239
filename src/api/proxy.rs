use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use directory_search::models::SearchRequest;

use crate::state::AppState;

/// GET /api - 健康检查
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Directory search proxy is running",
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": env!("BUILD_TIME"),
        "upstream_configured": state.upstream.base_url().is_some(),
        "active_sessions": state.active_sessions()
    }))
}

fn backend_failed() -> Response {
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(json!({ "error": "Backend timeout or failed" })),
    )
        .into_response()
}

/// POST /api - 转发搜索请求到上游
///
/// The upstream body and content type are passed through untouched. Any
/// failure, including a body that is not a search request, answers 408.
pub async fn proxy_search(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: SearchRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejecting malformed search body: {}", e);
            return backend_failed();
        }
    };

    match state.upstream.forward_search(&request).await {
        Ok(upstream) => {
            tracing::debug!("Proxied search '{}' (limit {})", request.term, request.response_limit);
            let content_type = upstream
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            ([(header::CONTENT_TYPE, content_type)], upstream.bytes).into_response()
        }
        Err(e) => {
            tracing::warn!("Proxied search '{}' failed: {}", request.term, e);
            backend_failed()
        }
    }
}

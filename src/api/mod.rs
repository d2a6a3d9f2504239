pub mod proxy;
pub mod session;

use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::state::AppState;

/// Application routes without middleware layers / 路由表
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(proxy::health_check).post(proxy::proxy_search))
        .route("/ws", get(session::ws_handler))
        .fallback(not_found)
        .with_state(state)
}

/// JSON 404 for unknown paths / 未知路径
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("No route for {}", uri.path())
        })),
    )
}

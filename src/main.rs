use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use directory_search::config;
use directory_search::search::load_dataset;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "directory_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);
    match &app_config.upstream.base_url {
        Some(url) => tracing::info!("Upstream directory service: {}", url),
        None => tracing::warn!(
            "No upstream configured, set {} or upstream.base_url",
            config::UPSTREAM_URL_ENV
        ),
    }

    // Load dataset / 加载数据集
    let dataset = load_dataset(&app_config.get_dataset_path());
    tracing::info!("Dataset ready with {} entries", dataset.len());

    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::new(app_config, dataset));

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

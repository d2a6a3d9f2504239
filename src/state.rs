use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use directory_search::config::AppConfig;
use directory_search::models::DirectoryEntry;
use directory_search::search::RemoteSearchClient;
use directory_search::upstream::UpstreamClient;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub config: AppConfig,
    /// Loaded once at start-up, shared read-only by all sessions / 启动时加载的数据集
    pub dataset: Arc<Vec<DirectoryEntry>>,
    pub upstream: Arc<UpstreamClient>,
    pub search_client: Arc<RemoteSearchClient>,
    active_sessions: AtomicUsize,
}

impl AppState {
    pub fn new(config: AppConfig, dataset: Arc<Vec<DirectoryEntry>>) -> Self {
        let timeout = config.upstream_timeout();
        let upstream = Arc::new(UpstreamClient::new(config.upstream.base_url.as_deref(), timeout));
        let search_client = Arc::new(RemoteSearchClient::with_timeout(upstream.clone(), timeout));

        Self {
            config,
            dataset,
            upstream,
            search_client,
            active_sessions: AtomicUsize::new(0),
        }
    }

    pub fn session_opened(&self) -> usize {
        self.active_sessions.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn session_closed(&self) -> usize {
        self.active_sessions.fetch_sub(1, Ordering::SeqCst).saturating_sub(1)
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

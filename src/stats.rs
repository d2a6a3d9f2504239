//! Usage statistics poller / 使用统计轮询
//!
//! Fetches aggregate counters on start and then every interval. A failed
//! poll never surfaces: before the first success a fixed fallback count is
//! published, after it the last good snapshot stays in place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;
use crate::models::StatsSnapshot;

/// Default poll interval / 默认轮询间隔
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Placeholder total shown when no poll has ever succeeded / 无成功结果时的占位总数
pub const FALLBACK_TOTAL_REQUESTS: u64 = 1000;

/// Transport seam for the stats service / 统计服务接口
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, SearchError>;
}

/// Published stats state / 对外发布的统计状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    /// True until the first poll completes / 首次轮询完成前为 true
    pub loading: bool,
    pub snapshot: Option<StatsSnapshot>,
    /// Snapshot is the fallback placeholder / 当前为占位数据
    pub is_fallback: bool,
}

impl Default for StatsView {
    fn default() -> Self {
        Self {
            loading: true,
            snapshot: None,
            is_fallback: false,
        }
    }
}

impl StatsView {
    pub fn total_requests(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.total_requests)
    }

    fn has_success(&self) -> bool {
        self.snapshot.is_some() && !self.is_fallback
    }

    /// Fold one poll result into the view / 合并一次轮询结果
    pub fn apply_poll(&mut self, result: Result<StatsSnapshot, SearchError>, fallback_total: u64) {
        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.is_fallback = false;
            }
            Err(e) if self.has_success() => {
                tracing::debug!("Stats poll failed, keeping last snapshot: {}", e);
            }
            Err(e) => {
                tracing::debug!("Stats poll failed, publishing fallback: {}", e);
                self.snapshot = Some(StatsSnapshot::new(fallback_total, Vec::new()));
                self.is_fallback = true;
            }
        }
    }
}

/// Background poll loop handle / 后台轮询句柄
///
/// Stops on [`StatsPoller::stop`] or when dropped.
pub struct StatsPoller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    rx: watch::Receiver<StatsView>,
}

impl StatsPoller {
    pub fn start(source: Arc<dyn StatsSource>, interval: Duration, fallback_total: u64) -> Self {
        let (tx, rx) = watch::channel(StatsView::default());
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = source.fetch_stats() => result,
                };

                tx.send_modify(|view| view.apply_poll(result, fallback_total));
            }
            tracing::debug!("Stats poller stopped");
        });

        Self { cancel, handle, rx }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatsView> {
        self.rx.clone()
    }

    pub fn current(&self) -> StatsView {
        self.rx.borrow().clone()
    }

    /// No poll fires after this returns / 停止后不再轮询
    pub fn stop(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Remote call failure taxonomy / 远程调用错误分类

use thiserror::Error;

/// Every way a remote search or stats poll can fail.
///
/// None of these ever reach the view: the search client and the proxy turn
/// them into typed outcomes, the stats poller into a fallback or stale value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// DNS, connection refused, unreadable body, missing base URL / 网络错误
    #[error("network failure: {0}")]
    Network(String),
    /// Exceeded the request bound / 请求超时
    #[error("request timed out after {0}s")]
    Timeout(u64),
    /// Non-2xx status from upstream / 上游返回错误状态
    #[error("upstream returned status {0}")]
    Upstream(u16),
    /// Success, but nothing matched / 成功但无结果
    #[error("upstream returned no results")]
    EmptyResult,
}

impl SearchError {
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Network(_) => "network",
            SearchError::Timeout(_) => "timeout",
            SearchError::Upstream(_) => "upstream",
            SearchError::EmptyResult => "empty",
        }
    }
}

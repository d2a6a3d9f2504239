//! Remote search client / 远程搜索客户端
//!
//! Issues one bounded request and reports what happened as a value. Every
//! failure mode becomes [`RemoteOutcome::Failed`]; nothing propagates past
//! this boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::SearchError;
use crate::models::{
    retain_identified, DirectoryEntry, ResponseLimit, SearchRequest, SearchResponse, UpstreamSource,
};

/// Default bound for one remote search (outer proxy hop) / 默认超时
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(90);

/// Transport seam for the remote search service / 远程搜索传输接口
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}

/// Result of one remote search / 一次远程搜索的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteOutcome {
    Found {
        results: Vec<DirectoryEntry>,
        elapsed_ms: u64,
        upstream_source: Option<UpstreamSource>,
    },
    Failed {
        elapsed_ms: u64,
        #[serde(serialize_with = "serialize_reason")]
        reason: SearchError,
    },
}

fn serialize_reason<S: serde::Serializer>(reason: &SearchError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(reason.kind())
}

pub struct RemoteSearchClient {
    backend: Arc<dyn SearchBackend>,
    timeout: Duration,
}

impl RemoteSearchClient {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_timeout(backend, DEFAULT_SEARCH_TIMEOUT)
    }

    pub fn with_timeout(backend: Arc<dyn SearchBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Search `term`, never failing / 搜索（不会抛出错误）
    pub async fn search(&self, term: &str, limit: ResponseLimit) -> RemoteOutcome {
        let request = SearchRequest {
            term: term.to_string(),
            response_limit: limit.get(),
        };

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.backend.search(&request)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(self.timeout.as_secs())),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = result.map(|mut response| {
            let (results, dropped) = retain_identified(response.results);
            if dropped > 0 {
                tracing::warn!(
                    "Remote search '{}' dropped {} entries without a unique url",
                    term,
                    dropped
                );
            }
            response.results = results;
            response
        });

        match result {
            Ok(response) if !response.results.is_empty() => {
                tracing::debug!(
                    "Remote search '{}' returned {} results in {}ms",
                    term,
                    response.results.len(),
                    elapsed_ms
                );
                RemoteOutcome::Found {
                    results: response.results,
                    elapsed_ms,
                    upstream_source: response.source,
                }
            }
            Ok(_) => RemoteOutcome::Failed {
                elapsed_ms,
                reason: SearchError::EmptyResult,
            },
            Err(reason) => {
                tracing::warn!(
                    "Remote search '{}' failed after {}ms: {}",
                    term,
                    elapsed_ms,
                    reason
                );
                RemoteOutcome::Failed { elapsed_ms, reason }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::search::dataset::seed_entries;
    use parking_lot::Mutex;

    /// Scripted backend: replies with `reply` after `latency` / 测试用后端
    pub(crate) struct FakeBackend {
        pub latency: Duration,
        pub reply: Mutex<Box<dyn FnMut(&SearchRequest) -> Result<SearchResponse, SearchError> + Send>>,
        pub requests: Mutex<Vec<SearchRequest>>,
    }

    impl FakeBackend {
        pub(crate) fn new<F>(latency: Duration, reply: F) -> Arc<Self>
        where
            F: FnMut(&SearchRequest) -> Result<SearchResponse, SearchError> + Send + 'static,
        {
            Arc::new(Self {
                latency,
                reply: Mutex::new(Box::new(reply)),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
            self.requests.lock().push(request.clone());
            tokio::time::sleep(self.latency).await;
            let mut reply = self.reply.lock();
            (&mut **reply)(request)
        }
    }

    fn found(results: Vec<DirectoryEntry>) -> Result<SearchResponse, SearchError> {
        Ok(SearchResponse {
            source: Some(UpstreamSource::Live),
            results,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_found_reports_elapsed() {
        let backend = FakeBackend::new(Duration::from_millis(250), |_| found(seed_entries()));
        let client = RemoteSearchClient::new(backend.clone());

        let outcome = client.search("addis", ResponseLimit::try_from(5).unwrap()).await;
        match outcome {
            RemoteOutcome::Found { results, elapsed_ms, upstream_source } => {
                assert_eq!(results.len(), 3);
                assert!(elapsed_ms >= 250);
                assert_eq!(upstream_source, Some(UpstreamSource::Live));
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let sent = backend.requests.lock();
        assert_eq!(sent[0], SearchRequest { term: "addis".to_string(), response_limit: 5 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_results_are_a_failure() {
        let backend = FakeBackend::new(Duration::from_millis(10), |_| found(Vec::new()));
        let client = RemoteSearchClient::new(backend);

        let outcome = client.search("nothing", ResponseLimit::default()).await;
        match outcome {
            RemoteOutcome::Failed { reason, elapsed_ms } => {
                assert_eq!(reason, SearchError::EmptyResult);
                assert!(elapsed_ms >= 10);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_without_identity_dropped() {
        let backend = FakeBackend::new(Duration::ZERO, |_| {
            let body = r#"{"source":"live","results":[
                {"company_name":"A","url":null},
                {"company_name":"B"},
                {"company_name":"C","url":"https://example.com/c"},
                {"company_name":"C again","url":"https://example.com/c"}
            ]}"#;
            Ok(serde_json::from_str(body).unwrap())
        });
        let client = RemoteSearchClient::new(backend);

        match client.search("c", ResponseLimit::default()).await {
            RemoteOutcome::Found { results, .. } => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].company_name, "C");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_unidentified_entries_is_empty() {
        let backend = FakeBackend::new(Duration::ZERO, |_| {
            Ok(serde_json::from_str(r#"{"results":[{"company_name":"A"},{"company_name":"B"}]}"#).unwrap())
        });
        let client = RemoteSearchClient::new(backend);

        assert!(matches!(
            client.search("a", ResponseLimit::default()).await,
            RemoteOutcome::Failed { reason: SearchError::EmptyResult, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_error_is_a_value() {
        let backend = FakeBackend::new(Duration::ZERO, |_| Err(SearchError::Upstream(502)));
        let client = RemoteSearchClient::new(backend);

        let outcome = client.search("banks", ResponseLimit::default()).await;
        assert!(matches!(
            outcome,
            RemoteOutcome::Failed { reason: SearchError::Upstream(502), .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bound() {
        let backend = FakeBackend::new(Duration::from_secs(600), |_| found(seed_entries()));
        let client = RemoteSearchClient::new(backend);

        let outcome = client.search("slow", ResponseLimit::default()).await;
        match outcome {
            RemoteOutcome::Failed { reason, elapsed_ms } => {
                assert_eq!(reason, SearchError::Timeout(90));
                assert!(elapsed_ms >= 90_000 && elapsed_ms < 600_000);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

//! Upstream directory service client / 上游目录服务客户端
//!
//! Speaks the upstream contract:
//! - `POST {base}/api/search` with `{term, response_limit}`
//! - `GET {base}/api/stats`
//!
//! A missing or malformed base URL is not a start-up error; every call then
//! fails with [`SearchError::Network`] and callers take their failure path.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::SearchError;
use crate::models::{KeywordCount, SearchRequest, SearchResponse, StatsSnapshot};
use crate::search::remote::SearchBackend;
use crate::stats::StatsSource;

/// Stats wire shape / 统计接口响应
#[derive(Debug, Deserialize)]
struct StatsBody {
    total_requests: u64,
    #[serde(default)]
    top_keywords: Vec<KeywordCount>,
}

/// Raw upstream search reply / 上游原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamBody {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub struct UpstreamClient {
    client: Client,
    base: Option<Url>,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Self {
        let base = base_url.and_then(|raw| match Url::parse(raw.trim()) {
            Ok(mut url) => {
                // join() replaces the last segment unless the path ends with '/'
                if !url.path().ends_with('/') {
                    let path = format!("{}/", url.path());
                    url.set_path(&path);
                }
                Some(url)
            }
            Err(e) => {
                tracing::warn!("Invalid upstream base URL '{}': {}", raw, e);
                None
            }
        });
        if base.is_none() {
            tracing::warn!("Upstream base URL not configured, remote search and stats will fail");
        }

        // Builder only fails when the TLS backend cannot initialise
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self { client, base, timeout }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        let base = self
            .base
            .as_ref()
            .ok_or_else(|| SearchError::Network("upstream base URL not configured".to_string()))?;
        base.join(path).map_err(|e| SearchError::Network(e.to_string()))
    }

    fn map_error(&self, e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout(self.timeout.as_secs())
        } else if let Some(status) = e.status() {
            SearchError::Upstream(status.as_u16())
        } else {
            SearchError::Network(e.to_string())
        }
    }

    /// Forward a search and return the upstream body untouched / 转发搜索请求
    pub async fn forward_search(
        &self,
        request: &SearchRequest,
    ) -> Result<UpstreamBody, SearchError> {
        let url = self.endpoint("api/search")?;
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if !resp.status().is_success() {
            return Err(SearchError::Upstream(resp.status().as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(|e| self.map_error(e))?;

        Ok(UpstreamBody { content_type, bytes })
    }
}

#[async_trait]
impl SearchBackend for UpstreamClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let body = self.forward_search(request).await?;
        serde_json::from_slice(&body.bytes)
            .map_err(|e| SearchError::Network(format!("invalid search body: {}", e)))
    }
}

#[async_trait]
impl StatsSource for UpstreamClient {
    async fn fetch_stats(&self) -> Result<StatsSnapshot, SearchError> {
        let url = self.endpoint("api/stats")?;
        let resp = self.client.get(url).send().await.map_err(|e| self.map_error(e))?;

        if !resp.status().is_success() {
            return Err(SearchError::Upstream(resp.status().as_u16()));
        }

        let body: StatsBody = resp.json().await.map_err(|e| self.map_error(e))?;
        Ok(StatsSnapshot::new(body.total_requests, body.top_keywords))
    }
}

//! Directory data model and upstream wire types / 目录数据模型与上游接口类型

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Selectable response limits / 可选的返回条数
pub const RESPONSE_LIMITS: [u32; 3] = [5, 10, 15];

/// Placeholder the upstream scraper stores for a missing website / 上游缺失网站时的占位符
const NOT_AVAILABLE: &str = "N/A";

/// A single business listing / 单条企业目录记录
///
/// `url` identifies the entry inside any result set. Entries are never
/// mutated once built; a new result set replaces the old one wholesale.
/// A missing or null `url` parses as empty; [`retain_identified`] removes
/// such entries at every boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_full: Option<String>,
    /// Product/service image URLs, in display order / 产品与服务图片
    #[serde(default, deserialize_with = "null_as_default")]
    pub products_and_services: Vec<String>,
}

impl DirectoryEntry {
    /// Short description for a collapsed entry / 折叠状态下显示的简短描述
    ///
    /// First sentence when it fits in 200 characters, otherwise the first
    /// 150 characters with an ellipsis.
    pub fn summary(&self) -> String {
        let description = match self.description_full.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => return "No description available.".to_string(),
        };

        let first_sentence = description.split('.').next().unwrap_or(description);
        if first_sentence.chars().count() <= 200 {
            return format!("{}.", first_sentence);
        }

        truncate_chars(description, 150)
    }

    /// Website only when it is a real link / 仅在为有效链接时返回网站
    pub fn website_link(&self) -> Option<&str> {
        self.website
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty() && !w.eq_ignore_ascii_case(NOT_AVAILABLE))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep entries with a usable identity / 保留可识别的记录
///
/// Drops entries whose `url` is blank and every later entry repeating an
/// earlier `url`, preserving order. Returns the kept entries and the number
/// dropped.
pub fn retain_identified(entries: Vec<DirectoryEntry>) -> (Vec<DirectoryEntry>, usize) {
    let total = entries.len();
    let mut seen = HashSet::new();
    let kept: Vec<DirectoryEntry> = entries
        .into_iter()
        .filter(|e| !e.url.trim().is_empty() && seen.insert(e.url.clone()))
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// User-selected result limit, one of [`RESPONSE_LIMITS`] / 返回条数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ResponseLimit(u32);

impl ResponseLimit {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ResponseLimit {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for ResponseLimit {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if RESPONSE_LIMITS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("response limit must be one of {:?}, got {}", RESPONSE_LIMITS, value))
        }
    }
}

impl From<ResponseLimit> for u32 {
    fn from(limit: ResponseLimit) -> Self {
        limit.0
    }
}

/// Where the displayed results came from / 结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// No query, full dataset on screen / 无查询
    #[default]
    None,
    /// Local in-memory filter / 本地过滤
    Mock,
    /// Remote search service / 远程搜索服务
    Backend,
}

/// Body of `POST /api` and `POST {base}/api/search` / 搜索请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub term: String,
    #[serde(default = "default_response_limit")]
    pub response_limit: u32,
}

fn default_response_limit() -> u32 {
    ResponseLimit::default().get()
}

/// Upstream cache provenance / 上游数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamSource {
    Cache,
    Live,
    Database,
    #[serde(other)]
    Unknown,
}

/// Upstream search response / 上游搜索响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub source: Option<UpstreamSource>,
    #[serde(default)]
    pub results: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

/// Aggregate usage counters / 使用统计快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    #[serde(default)]
    pub top_keywords: Vec<KeywordCount>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn new(total_requests: u64, top_keywords: Vec<KeywordCount>) -> Self {
        Self {
            total_requests,
            top_keywords,
            fetched_at: Utc::now(),
        }
    }
}

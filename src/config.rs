//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{ResponseLimit, RESPONSE_LIMITS};
use crate::session::SessionSettings;

/// Environment variable overriding `upstream.base_url` / 上游地址环境变量
pub const UPSTREAM_URL_ENV: &str = "UPSTREAM_API_URL";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    pub server: ServerConfig,
    /// Upstream directory service / 上游目录服务
    pub upstream: UpstreamConfig,
    /// Search behaviour / 搜索配置
    pub search: SearchConfig,
    /// Stats polling / 统计轮询配置
    pub stats: StatsConfig,
    /// Local dataset / 本地数据集
    pub dataset: DatasetConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Upstream configuration / 上游配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the directory service, e.g. `https://host/` / 上游基础地址
    pub base_url: Option<String>,
    /// Request timeout in seconds / 请求超时（秒）
    pub timeout_secs: u64,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet window before a remote search / 防抖时长（毫秒）
    pub debounce_ms: u64,
    /// Initial response limit, one of 5/10/15 / 默认返回条数
    pub default_limit: u32,
}

/// Stats configuration / 统计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub interval_secs: u64,
    /// Total shown before any poll succeeded / 占位总数
    pub fallback_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// JSON array of directory entries / 数据集文件路径
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8180,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 90,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 800,
            default_limit: 10,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            fallback_total: 1000,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: "data/directory.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub fn get_dataset_path(&self) -> PathBuf {
        PathBuf::from(&self.dataset.path)
    }

    /// Per-session settings derived from config / 会话参数
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            debounce: Duration::from_millis(self.search.debounce_ms),
            stats_interval: Duration::from_secs(self.stats.interval_secs),
            stats_fallback_total: self.stats.fallback_total,
            default_limit: ResponseLimit::try_from(self.search.default_limit).unwrap_or_default(),
        }
    }

    /// Env value wins over the file; blank values are ignored / 环境变量覆盖
    pub fn apply_upstream_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.upstream.base_url = Some(url);
        }
    }

    /// Check value ranges / 校验配置
    pub fn validate(&self) -> Result<(), String> {
        if !RESPONSE_LIMITS.contains(&self.search.default_limit) {
            return Err(format!(
                "search.default_limit must be one of {:?}, got {}",
                RESPONSE_LIMITS, self.search.default_limit
            ));
        }
        if self.stats.interval_secs == 0 {
            return Err("stats.interval_secs must be greater than 0".to_string());
        }
        if self.upstream.timeout_secs == 0 {
            return Err("upstream.timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from ./config.json plus env override / 加载配置文件
pub fn load_config() -> Result<AppConfig, String> {
    let mut config = load_config_from(&get_config_path())?;
    config.apply_upstream_override(std::env::var(UPSTREAM_URL_ENV).ok());
    config.validate()?;
    Ok(config)
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config_to(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("directory-search-config-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.get_bind_address(), "0.0.0.0:8180");
        assert_eq!(config.upstream_timeout(), Duration::from_secs(90));
        assert_eq!(config.upstream.base_url, None);
        assert_eq!(config.get_dataset_path(), PathBuf::from("data/directory.json"));

        let settings = config.session_settings();
        assert_eq!(settings.debounce, Duration::from_millis(800));
        assert_eq!(settings.stats_interval, Duration::from_secs(30));
        assert_eq!(settings.stats_fallback_total, 1000);
        assert_eq!(settings.default_limit.get(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_first_run_creates_file() {
        let path = temp_path();
        let config = load_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 8180);

        let reloaded = load_config_from(&path).unwrap();
        assert_eq!(reloaded.search.debounce_ms, 800);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path();
        std::fs::write(&path, r#"{"server":{"port":9000},"upstream":{"base_url":"http://up:8000/"}}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.upstream.base_url.as_deref(), Some("http://up:8000/"));
        assert_eq!(config.upstream.timeout_secs, 90);
        assert_eq!(config.stats.fallback_total, 1000);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_file_is_error() {
        let path = temp_path();
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config file"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_upstream_override() {
        let mut config = AppConfig::default();
        config.upstream.base_url = Some("http://file/".to_string());

        config.apply_upstream_override(Some("  ".to_string()));
        assert_eq!(config.upstream.base_url.as_deref(), Some("http://file/"));

        config.apply_upstream_override(None);
        assert_eq!(config.upstream.base_url.as_deref(), Some("http://file/"));

        config.apply_upstream_override(Some("http://env/".to_string()));
        assert_eq!(config.upstream.base_url.as_deref(), Some("http://env/"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.search.default_limit = 7;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.stats.interval_secs = 0;
        assert!(config.validate().is_err());
    }
}

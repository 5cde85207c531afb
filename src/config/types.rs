//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 对象作品配置
    #[serde(default)]
    pub work: WorkConfig,

    /// 取得源配置
    #[serde(default)]
    pub source: SourceConfig,

    /// 页面缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work: WorkConfig::default(),
            source: SourceConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 对象作品配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkConfig {
    /// 作品识别码（N コード，如 n1234ab）
    #[serde(default)]
    pub ncode: String,

    /// 开始话数（含）
    #[serde(default)]
    pub start: Option<u32>,

    /// 结束话数（含）
    #[serde(default)]
    pub end: Option<u32>,

    /// 生成前清除该作品的缓存条目（强制重新取得）
    #[serde(default)]
    pub refresh: bool,
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            ncode: String::new(),
            start: None,
            end: None,
            refresh: false,
        }
    }
}

/// 取得源配置
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// 开发者 API 地址
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// 作品页面基底 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 逐话下载间隔（毫秒）
    #[serde(default = "default_download_interval_ms")]
    pub download_interval_ms: u64,

    /// 每 N 话插入一次长等待；0 关闭
    #[serde(default = "default_long_wait_every")]
    pub long_wait_every: u32,

    /// 长等待时长（毫秒）
    #[serde(default = "default_long_wait_ms")]
    pub long_wait_ms: u64,

    /// API 调用间隔（毫秒）
    #[serde(default = "default_api_interval_ms")]
    pub api_interval_ms: u64,
}

fn default_api_url() -> String {
    "https://api.syosetu.com/novelapi/api/".to_string()
}

fn default_base_url() -> String {
    "https://ncode.syosetu.com".to_string()
}

fn default_user_agent() -> String {
    "tatebon/0.1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_download_interval_ms() -> u64 {
    // robots.txt の Crawl-delay: 1 準拠
    1100
}

fn default_long_wait_every() -> u32 {
    10
}

fn default_long_wait_ms() -> u64 {
    5000
}

fn default_api_interval_ms() -> u64 {
    3000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            download_interval_ms: default_download_interval_ms(),
            long_wait_every: default_long_wait_every(),
            long_wait_ms: default_long_wait_ms(),
            api_interval_ms: default_api_interval_ms(),
        }
    }
}

/// 页面缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 是否启用缓存
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// 缓存目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// 每卷正文的原始字节预算
    ///
    /// Send to Kindle 上限 200MB に余裕を持たせた値。
    /// テキストの生サイズ(UTF-8)で判定、圧縮後は約 1/3 になる
    #[serde(default = "default_volume_threshold_bytes")]
    pub volume_threshold_bytes: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_volume_threshold_bytes() -> u64 {
    180 * 1024 * 1024 // 180MB
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            volume_threshold_bytes: default_volume_threshold_bytes(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.source.base_url, "https://ncode.syosetu.com");
        assert_eq!(config.source.download_interval_ms, 1100);
        assert_eq!(config.output.volume_threshold_bytes, 180 * 1024 * 1024);
        assert!(config.cache.enabled);
        assert!(config.work.ncode.is_empty());
    }
}

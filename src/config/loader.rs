//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TATEBON_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TATEBON_WORK__NCODE=n1234ab`
/// - `TATEBON_WORK__START=10`
/// - `TATEBON_CACHE__ENABLED=false`
/// - `TATEBON_OUTPUT__DIR=/data/epub`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("work.ncode", "")?
        .set_default("work.refresh", false)?
        .set_default("source.api_url", "https://api.syosetu.com/novelapi/api/")?
        .set_default("source.base_url", "https://ncode.syosetu.com")?
        .set_default("source.user_agent", "tatebon/0.1")?
        .set_default("source.timeout_secs", 30)?
        .set_default("source.download_interval_ms", 1100)?
        .set_default("source.long_wait_every", 10)?
        .set_default("source.long_wait_ms", 5000)?
        .set_default("source.api_interval_ms", 3000)?
        .set_default("cache.enabled", true)?
        .set_default("cache.dir", "cache")?
        .set_default("output.dir", "output")?
        .set_default("output.volume_threshold_bytes", 180_u64 * 1024 * 1024)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: TATEBON_
    // 层级分隔符: __ (双下划线)
    // 例如: TATEBON_WORK__NCODE=n1234ab
    builder = builder.add_source(
        Environment::with_prefix("TATEBON")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证作品识别码
    if config.work.ncode.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "work.ncode must be set (e.g. TATEBON_WORK__NCODE=n1234ab)".to_string(),
        ));
    }

    // 验证话数范围
    if let (Some(start), Some(end)) = (config.work.start, config.work.end) {
        if start > end {
            return Err(ConfigError::ValidationError(
                "work.start cannot be greater than work.end".to_string(),
            ));
        }
    }

    // 验证分卷阈值
    if config.output.volume_threshold_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "output.volume_threshold_bytes cannot be 0".to_string(),
        ));
    }

    // 验证取得源 URL
    if config.source.api_url.is_empty() || config.source.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "source.api_url and source.base_url cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Work: {}", config.work.ncode);
    if config.work.start.is_some() || config.work.end.is_some() {
        tracing::info!(
            "Episode Range: {:?} - {:?}",
            config.work.start,
            config.work.end
        );
    }
    tracing::info!("Source Base URL: {}", config.source.base_url);
    tracing::info!(
        "Download Interval: {}ms (long wait {}ms every {} episodes)",
        config.source.download_interval_ms,
        config.source.long_wait_ms,
        config.source.long_wait_every
    );
    tracing::info!("Cache Enabled: {}", config.cache.enabled);
    if config.cache.enabled {
        tracing::info!("Cache Directory: {:?}", config.cache.dir);
    }
    tracing::info!("Output Directory: {:?}", config.output.dir);
    tracing::info!(
        "Volume Threshold: {} bytes",
        config.output.volume_threshold_bytes
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.work.ncode = "n1234ab".to_string();
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_missing_ncode() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_range() {
        let mut config = valid_config();
        config.work.start = Some(10);
        config.work.end = Some(5);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_threshold() {
        let mut config = valid_config();
        config.output.volume_threshold_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_base_url() {
        let mut config = valid_config();
        config.source.base_url = String::new();
        assert!(validate_config(&config).is_err());
    }
}

//! Page Cache Port - 取得结果缓存
//!
//! 定义页面级缓存的抽象接口，按 (category, key) 存取 JSON 值。
//! 具体实现为文件系统上的 JSON 文件（infrastructure/persistence）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 缓存错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 缓存信封：取得时刻 + 原始值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// 取得时刻
    pub fetched_at: DateTime<Utc>,
    /// 缓存的 JSON 值
    pub value: serde_json::Value,
}

impl CacheEnvelope {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            fetched_at: Utc::now(),
            value,
        }
    }
}

/// Page Cache Port
///
/// - category: "metadata" / "toc" / "episode" 等
/// - key: 作品识别码或 `{ncode}_{话数}`
#[async_trait]
pub trait PageCachePort: Send + Sync {
    /// 读取缓存，未命中返回 `Ok(None)`
    async fn get(&self, category: &str, key: &str) -> Result<Option<CacheEnvelope>, CacheError>;

    /// 写入缓存
    async fn put(
        &self,
        category: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), CacheError>;

    /// 清除缓存
    ///
    /// - `Some(ncode)`: 只清除该作品相关条目
    /// - `None`: 清除全部
    ///
    /// 返回删除的条目数
    async fn clear(&self, ncode: Option<&str>) -> Result<u64, CacheError>;
}

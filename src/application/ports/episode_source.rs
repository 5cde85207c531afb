//! Episode Source Port - 作品取得源抽象
//!
//! 定义话数据检索的抽象接口（元数据・目录・正文・插图），
//! 具体实现在 infrastructure/adapters 层。
//! 限速、HTML 抽取等细节全部属于适配器，核心层不感知

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 取得源错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 作品元数据（开发者 API 返回的记录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkMetadata {
    /// 作品识别码（N コード，小写）
    pub ncode: String,
    /// 作品标题
    pub title: String,
    /// 作者名
    pub writer: String,
    /// 全话数（API 的 general_all_no）
    pub total_episodes: Option<u32>,
}

/// 目录条目：一话的元信息（正文未取得）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    /// 话数（按文档顺序从 1 连番）
    pub number: u32,
    /// 话标题（可为空）
    pub title: String,
    /// 所属章节标签，None 表示不属于任何章节
    pub chapter: Option<String>,
}

/// 作品目录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableOfContents {
    /// 章节标签，去重后按首次出现顺序
    pub chapters: Vec<String>,
    /// 全部话，文档顺序
    pub entries: Vec<TocEntry>,
}

/// Episode Source Port
///
/// 外部取得源（なろう站点 + 开发者 API）的抽象接口
#[async_trait]
pub trait EpisodeSourcePort: Send + Sync {
    /// 取得作品元数据
    ///
    /// 作品不存在时返回 `Ok(None)`
    async fn fetch_metadata(&self, ncode: &str) -> Result<Option<WorkMetadata>, SourceError>;

    /// 取得目录（章节结构 + 话列表，跨分页）
    async fn fetch_toc(&self, ncode: &str) -> Result<TableOfContents, SourceError>;

    /// 取得一话的正文 HTML 片段
    async fn fetch_episode_body(&self, ncode: &str, number: u32) -> Result<String, SourceError>;

    /// 下载插图
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

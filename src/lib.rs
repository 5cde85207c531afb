//! Tatebon - なろう小説の縦書き EPUB 変換システム
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Work Context: 作品（话・卷）管理
//! - transform: 正文变换管线（ルビ・傍点記法 → 標記、半角 → 縦書き字形）
//! - volume_splitter: 尺寸预算下的分卷算法
//!
//! 应用层 (application/):
//! - Ports: 端口定义（EpisodeSource, PageCache, BookPackager）
//! - Commands: 命令处理器（BuildBook, ClearCache）
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: Narou 取得源（限速付き HTTP）、EPUB3 打包器
//! - Persistence: JSON 文件页面缓存

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

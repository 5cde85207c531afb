//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（EpisodeSource、PageCache、BookPackager）
//! - commands: 命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{BuildBookHandler, BuildBookResponse, ClearCacheHandler},
    BuildBook, ClearCache,
};

pub use error::ApplicationError;

pub use ports::{
    BookPackagerPort, CacheEnvelope, CacheError, EpisodeSourcePort, PackageError, PageCachePort,
    SourceError, TableOfContents, TocEntry, WorkMetadata,
};

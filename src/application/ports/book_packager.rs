//! Book Packager Port - 容器打包抽象
//!
//! 把一卷打包为一个物理输出文件。命名方案由打包器自行
//! 从卷号・作品元数据・首末话数导出，核心层不关心

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use super::episode_source::WorkMetadata;
use crate::domain::work::Volume;

/// 打包错误
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid volume: {0}")]
    InvalidVolume(String),
}

/// Book Packager Port
#[async_trait]
pub trait BookPackagerPort: Send + Sync {
    /// 打包一卷，返回写出的文件路径
    ///
    /// 卷内容只读：正文中的插图引用改写发生在打包器
    /// 自己的副本上，不回写核心层的记录
    async fn package(
        &self,
        metadata: &WorkMetadata,
        volume: &Volume,
    ) -> Result<PathBuf, PackageError>;
}

//! Work Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("无效的话数: {0}（必须为正整数）")]
    InvalidEpisodeNumber(u32),
}

//! Work Context - 作品限界上下文
//!
//! 职责:
//! - 话（エピソード）与插图实体
//! - 卷实体与划分不变量
//! - 章节标签仅作为话的分组键，不单独建模

mod entities;
mod errors;

pub use entities::{Episode, EpisodeImage, Volume};
pub use errors::WorkError;

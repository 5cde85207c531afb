//! Narou 取得源适配器

mod http_episode_source;
mod rate_limiter;

pub use http_episode_source::{NarouEpisodeSource, NarouSourceConfig};
pub use rate_limiter::{ApiPacer, DownloadPacer, DownloadPacerConfig};

//! Build Command Handlers

use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::{BuildBook, ClearCache};
use crate::application::error::ApplicationError;
use crate::application::ports::{BookPackagerPort, EpisodeSourcePort, PageCachePort};
use crate::domain::split_into_volumes;
use crate::domain::transform::TextTransformer;
use crate::domain::work::{Episode, EpisodeImage};

// ============================================================================
// BuildBook
// ============================================================================

/// 生成完了响应
#[derive(Debug, Clone)]
pub struct BuildBookResponse {
    /// 作品标题
    pub title: String,
    /// 处理的话数
    pub episode_count: usize,
    /// 写出的卷文件路径（卷号顺）
    pub volume_paths: Vec<PathBuf>,
}

/// BuildBook Handler - 一次完整的转换运行
///
/// 编排顺序：元数据 → 目录 → 逐话取得+变换+插图下载 →
/// 分卷 → 逐卷打包
pub struct BuildBookHandler {
    source: Arc<dyn EpisodeSourcePort>,
    packager: Arc<dyn BookPackagerPort>,
    transformer: TextTransformer,
    /// 每卷正文的原始字节预算
    volume_threshold_bytes: u64,
    /// 正文中的插图引用 `<img src="...">`
    image_pattern: Regex,
}

impl BuildBookHandler {
    pub fn new(
        source: Arc<dyn EpisodeSourcePort>,
        packager: Arc<dyn BookPackagerPort>,
        volume_threshold_bytes: u64,
    ) -> Self {
        Self {
            source,
            packager,
            transformer: TextTransformer::new(),
            volume_threshold_bytes,
            image_pattern: Regex::new(r#"<img[^>]+src="([^"]+)""#).expect("固定模式必然编译通过"),
        }
    }

    pub async fn handle(&self, command: BuildBook) -> Result<BuildBookResponse, ApplicationError> {
        let ncode = command.ncode.to_lowercase();

        // 1. 元数据
        let metadata = self
            .source
            .fetch_metadata(&ncode)
            .await?
            .ok_or_else(|| ApplicationError::not_found("work", ncode.clone()))?;
        tracing::info!(
            ncode = %ncode,
            title = %metadata.title,
            writer = %metadata.writer,
            total = ?metadata.total_episodes,
            "Work metadata fetched"
        );

        // 2. 目录・章节结构
        let toc = self.source.fetch_toc(&ncode).await?;

        // 3. 话数范围过滤
        let mut entries = toc.entries;
        if let Some(start) = command.start {
            entries.retain(|e| e.number >= start);
        }
        if let Some(end) = command.end {
            entries.retain(|e| e.number <= end);
        }
        if entries.is_empty() {
            return Err(ApplicationError::validation("指定范围内没有任何话"));
        }
        tracing::info!(
            count = entries.len(),
            first = entries.first().map(|e| e.number),
            last = entries.last().map(|e| e.number),
            "Episodes selected"
        );

        // 4. 逐话取得 + 正文变换 + 插图下载
        let mut episodes = Vec::with_capacity(entries.len());
        for entry in entries {
            let raw_body = self.source.fetch_episode_body(&ncode, entry.number).await?;
            let body = self.transformer.transform(&raw_body);
            let images = self.collect_images(&body).await?;

            let mut episode = Episode::new(entry.number, entry.title, entry.chapter)
                .map_err(|e| ApplicationError::internal(e.to_string()))?;
            episode.set_body(body);
            episode.set_images(images);

            tracing::debug!(
                number = episode.number(),
                body_bytes = episode.body_size_bytes(),
                images = episode.images().len(),
                "Episode prepared"
            );
            episodes.push(episode);
        }
        let episode_count = episodes.len();

        // 5. 分卷 + 打包
        let volumes = split_into_volumes(&toc.chapters, episodes, self.volume_threshold_bytes);
        tracing::info!(volumes = volumes.len(), "Volume split complete");

        let mut volume_paths = Vec::with_capacity(volumes.len());
        for volume in &volumes {
            let path = self.packager.package(&metadata, volume).await?;
            tracing::info!(
                volume = volume.number(),
                episodes = volume.episode_count(),
                path = %path.display(),
                "Volume packaged"
            );
            volume_paths.push(path);
        }

        Ok(BuildBookResponse {
            title: metadata.title,
            episode_count,
            volume_paths,
        })
    }

    /// 检出正文中的插图引用并下载
    ///
    /// 协议相对 URL 补全为 https，其他相对引用跳过
    async fn collect_images(&self, body: &str) -> Result<Vec<EpisodeImage>, ApplicationError> {
        let mut images = Vec::new();
        for caps in self.image_pattern.captures_iter(body) {
            let src = &caps[1];
            let url = if let Some(rest) = src.strip_prefix("//") {
                format!("https://{rest}")
            } else if src.starts_with("http") {
                src.to_string()
            } else {
                tracing::debug!(src = %src, "Skipping non-absolute image reference");
                continue;
            };
            let data = self.source.fetch_image(&url).await?;
            images.push(EpisodeImage::new(src, data));
        }
        Ok(images)
    }
}

// ============================================================================
// ClearCache
// ============================================================================

/// ClearCache Handler
pub struct ClearCacheHandler {
    cache: Arc<dyn PageCachePort>,
}

impl ClearCacheHandler {
    pub fn new(cache: Arc<dyn PageCachePort>) -> Self {
        Self { cache }
    }

    /// 返回删除的条目数
    pub async fn handle(&self, command: ClearCache) -> Result<u64, ApplicationError> {
        let ncode = command.ncode.map(|n| n.to_lowercase());
        let removed = self.cache.clear(ncode.as_deref()).await?;
        tracing::info!(ncode = ?ncode, removed, "Page cache cleared");
        Ok(removed)
    }
}

//! Tatebon - なろう小説の縦書き EPUB 変換システム
//!
//! 取得 → 正文変換 → 分卷 → EPUB 打包の一連の実行入口。
//! 対象作品などの指定は設定ファイル / 環境変数から読む

use std::sync::Arc;
use std::time::Duration;

use tatebon::application::ports::PageCachePort;
use tatebon::application::{BuildBook, BuildBookHandler, ClearCache, ClearCacheHandler};
use tatebon::config::{load_config, print_config};
use tatebon::infrastructure::adapters::narou::DownloadPacerConfig;
use tatebon::infrastructure::{EpubPackager, JsonPageCache, NarouEpisodeSource, NarouSourceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},tatebon={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Tatebon - なろう小説の縦書き EPUB 変換");
    print_config(&config);

    let ncode = config.work.ncode.to_lowercase();

    // 页面缓存（可选）
    let cache: Option<Arc<dyn PageCachePort>> = if config.cache.enabled {
        let cache = JsonPageCache::new(&config.cache.dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open page cache: {}", e))?;
        Some(Arc::new(cache))
    } else {
        None
    };

    // refresh 指定时先清除该作品的缓存条目
    if config.work.refresh {
        if let Some(cache) = cache.clone() {
            let handler = ClearCacheHandler::new(cache);
            let removed = handler
                .handle(ClearCache {
                    ncode: Some(ncode.clone()),
                })
                .await?;
            tracing::info!(removed, "Cache entries refreshed");
        }
    }

    // Narou 取得源
    let source_config = NarouSourceConfig {
        api_url: config.source.api_url.clone(),
        base_url: config.source.base_url.clone(),
        user_agent: config.source.user_agent.clone(),
        timeout_secs: config.source.timeout_secs,
        download_pacer: DownloadPacerConfig {
            interval: Duration::from_millis(config.source.download_interval_ms),
            long_wait_every: config.source.long_wait_every,
            long_wait: Duration::from_millis(config.source.long_wait_ms),
        },
        api_interval: Duration::from_millis(config.source.api_interval_ms),
    };
    let source = Arc::new(NarouEpisodeSource::new(source_config, cache)?);

    // EPUB 打包器
    let packager = Arc::new(EpubPackager::new(config.output.dir.clone()));

    // 生成
    let handler = BuildBookHandler::new(source, packager, config.output.volume_threshold_bytes);
    let response = handler
        .handle(BuildBook {
            ncode,
            start: config.work.start,
            end: config.work.end,
        })
        .await?;

    tracing::info!(
        title = %response.title,
        episodes = response.episode_count,
        volumes = response.volume_paths.len(),
        "Conversion complete"
    );
    for path in &response.volume_paths {
        tracing::info!("  -> {}", path.display());
    }

    Ok(())
}

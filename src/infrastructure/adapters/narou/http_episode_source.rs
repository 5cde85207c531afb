//! Narou Episode Source - 从站点与开发者 API 取得作品数据
//!
//! 实现 EpisodeSourcePort trait：
//! - 元数据：开发者 API（JSON，首个元素是件数记录）
//! - 目录：作品首页的 p-eplist 结构（含 ?p=N 分页）
//! - 正文：话页面的 p-novel__text 区块（前书き・本文・後書き）
//!
//! 所有站点访问经过 DownloadPacer / ApiPacer 限速；
//! 挂接了页面缓存时先查缓存，取得成功后写回。
//! 只识别当前版式，旧版式（index_box / novel_honbun）不支持

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    EpisodeSourcePort, PageCachePort, SourceError, TableOfContents, TocEntry, WorkMetadata,
};

use super::rate_limiter::{ApiPacer, DownloadPacer, DownloadPacerConfig};

/// 取得源配置
#[derive(Debug, Clone)]
pub struct NarouSourceConfig {
    /// 开发者 API 地址
    pub api_url: String,
    /// 作品页面基底 URL
    pub base_url: String,
    /// User-Agent
    pub user_agent: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 逐话下载限速
    pub download_pacer: DownloadPacerConfig,
    /// API 调用间隔
    pub api_interval: Duration,
}

impl Default for NarouSourceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.syosetu.com/novelapi/api/".to_string(),
            base_url: "https://ncode.syosetu.com".to_string(),
            user_agent: "tatebon/0.1".to_string(),
            timeout_secs: 30,
            download_pacer: DownloadPacerConfig::default(),
            api_interval: Duration::from_secs(3),
        }
    }
}

/// 正文区块种别（区切り線の挿入判定用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Preface,
    Body,
    Afterword,
}

/// Narou 取得源
pub struct NarouEpisodeSource {
    client: Client,
    config: NarouSourceConfig,
    cache: Option<Arc<dyn PageCachePort>>,
    download_pacer: DownloadPacer,
    api_pacer: ApiPacer,
    /// 目录页的章节标题与话链接（按文档顺序混合匹配）
    index_entry: Regex,
    /// 目录的下一页链接
    next_pager: Regex,
    /// 话页面的正文区块
    text_section: Regex,
    /// 除去对象的 Web 属性（style / class / id）
    web_attrs: Regex,
    /// 取出纯文本用：任意标记
    any_tag: Regex,
}

impl NarouEpisodeSource {
    pub fn new(
        config: NarouSourceConfig,
        cache: Option<Arc<dyn PageCachePort>>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        let download_pacer = DownloadPacer::new(config.download_pacer.clone());
        let api_pacer = ApiPacer::new(config.api_interval);

        Ok(Self {
            client,
            config,
            cache,
            download_pacer,
            api_pacer,
            index_entry: Regex::new(
                r#"(?s)<div[^>]*class="[^"]*p-eplist__chapter-title[^"]*"[^>]*>(?P<chapter>.*?)</div>|<a[^>]*class="[^"]*p-eplist__subtitle[^"]*"[^>]*>(?P<subtitle>.*?)</a>"#,
            )
            .expect("固定模式必然编译通过"),
            next_pager: Regex::new(r#"<a[^>]*class="[^"]*c-pager__item--next[^"]*""#)
                .expect("固定模式必然编译通过"),
            text_section: Regex::new(
                r#"(?s)<div[^>]*class="(?P<cls>[^"]*p-novel__text[^"]*)"[^>]*>(?P<content>.*?)</div>"#,
            )
            .expect("固定模式必然编译通过"),
            web_attrs: Regex::new(r#"\s+(?:style|class|id)="[^"]*""#)
                .expect("固定模式必然编译通过"),
            any_tag: Regex::new(r"<[^>]*>").expect("固定模式必然编译通过"),
        })
    }

    // ------------------------------------------------------------------
    // HTTP / 缓存辅助
    // ------------------------------------------------------------------

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else if e.is_connect() {
                SourceError::NetworkError(format!("Cannot connect: {}", e))
            } else {
                SourceError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ServiceError(format!("HTTP {} for {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }

    /// 缓存读取；缓存故障降级为未命中
    async fn cache_get(&self, category: &str, key: &str) -> Option<serde_json::Value> {
        let cache = self.cache.as_ref()?;
        match cache.get(category, key).await {
            Ok(hit) => hit.map(|envelope| envelope.value),
            Err(e) => {
                tracing::warn!(category, key, error = %e, "Page cache read failed");
                None
            }
        }
    }

    /// 缓存写入；缓存故障只记警告，不影响取得结果
    async fn cache_put(&self, category: &str, key: &str, value: &serde_json::Value) {
        if let Some(cache) = self.cache.as_ref() {
            if let Err(e) = cache.put(category, key, value).await {
                tracing::warn!(category, key, error = %e, "Page cache write failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // HTML 抽取
    // ------------------------------------------------------------------

    /// 捕获片段 → 纯文本（标记除去・实体还原・trim）
    fn clean_text(&self, fragment: &str) -> String {
        let text = self.any_tag.replace_all(fragment, "");
        unescape_entities(text.trim())
    }

    /// 扫描一页目录，按文档顺序积累章节标签与话条目
    fn scan_index_page(
        &self,
        html: &str,
        chapters: &mut Vec<String>,
        entries: &mut Vec<TocEntry>,
        current_chapter: &mut Option<String>,
        next_number: &mut u32,
    ) {
        for caps in self.index_entry.captures_iter(html) {
            if let Some(chapter) = caps.name("chapter") {
                let label = self.clean_text(chapter.as_str());
                if label.is_empty() {
                    continue;
                }
                if !chapters.contains(&label) {
                    chapters.push(label.clone());
                }
                *current_chapter = Some(label);
            } else if let Some(subtitle) = caps.name("subtitle") {
                *next_number += 1;
                entries.push(TocEntry {
                    number: *next_number,
                    title: self.clean_text(subtitle.as_str()),
                    chapter: current_chapter.clone(),
                });
            }
        }
    }

    fn has_next_page(&self, html: &str) -> bool {
        self.next_pager.is_match(html)
    }

    /// 话页面 → 正文 HTML 片段
    ///
    /// 前書き・本文・後書き区块按出现顺序连接，
    /// 种别切换处插入区切り線；Web 用属性除去
    fn extract_episode_body(&self, html: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut prev_kind: Option<SectionKind> = None;

        for caps in self.text_section.captures_iter(html) {
            let cls = &caps["cls"];
            let kind = if cls.contains("p-novel__text--preface") {
                SectionKind::Preface
            } else if cls.contains("p-novel__text--afterword") {
                SectionKind::Afterword
            } else {
                SectionKind::Body
            };

            if prev_kind.is_some() && prev_kind != Some(kind) {
                parts.push("<hr />".to_string());
            }
            parts.push(self.web_attrs.replace_all(&caps["content"], "").into_owned());
            prev_kind = Some(kind);
        }

        parts.join("\n")
    }

    fn index_url(&self, ncode: &str, page: u32) -> String {
        if page <= 1 {
            format!("{}/{}/", self.config.base_url, ncode)
        } else {
            format!("{}/{}/?p={}", self.config.base_url, ncode, page)
        }
    }
}

#[async_trait]
impl EpisodeSourcePort for NarouEpisodeSource {
    async fn fetch_metadata(&self, ncode: &str) -> Result<Option<WorkMetadata>, SourceError> {
        if let Some(value) = self.cache_get("metadata", ncode).await {
            if let Ok(metadata) = serde_json::from_value::<WorkMetadata>(value) {
                return Ok(Some(metadata));
            }
        }

        self.api_pacer.pace().await;

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[("out", "json"), ("ncode", ncode), ("lim", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ServiceError(format!("HTTP {}", status)));
        }

        // API は先頭に件数レコードが入る
        let records: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
        if records.len() < 2 {
            return Ok(None);
        }

        let record = &records[1];
        let metadata = WorkMetadata {
            ncode: ncode.to_lowercase(),
            title: record["title"].as_str().unwrap_or("").to_string(),
            writer: record["writer"].as_str().unwrap_or("").to_string(),
            total_episodes: record["general_all_no"].as_u64().map(|n| n as u32),
        };

        if let Ok(value) = serde_json::to_value(&metadata) {
            self.cache_put("metadata", ncode, &value).await;
        }

        tracing::info!(ncode, title = %metadata.title, "Metadata fetched");
        Ok(Some(metadata))
    }

    async fn fetch_toc(&self, ncode: &str) -> Result<TableOfContents, SourceError> {
        if let Some(value) = self.cache_get("toc", ncode).await {
            if let Ok(toc) = serde_json::from_value::<TableOfContents>(value) {
                return Ok(toc);
            }
        }

        let mut toc = TableOfContents::default();
        let mut current_chapter: Option<String> = None;
        let mut next_number = 0u32;
        let mut page = 1u32;

        loop {
            self.download_pacer.pace().await;
            let html = self.get_text(&self.index_url(ncode, page)).await?;

            if page == 1 && !html.contains("p-eplist") {
                // 目次のない短編は 1 話構成
                toc.entries.push(TocEntry {
                    number: 1,
                    title: String::new(),
                    chapter: None,
                });
                break;
            }

            self.scan_index_page(
                &html,
                &mut toc.chapters,
                &mut toc.entries,
                &mut current_chapter,
                &mut next_number,
            );

            if self.has_next_page(&html) {
                page += 1;
            } else {
                break;
            }
        }

        if let Ok(value) = serde_json::to_value(&toc) {
            self.cache_put("toc", ncode, &value).await;
        }

        tracing::info!(
            ncode,
            chapters = toc.chapters.len(),
            episodes = toc.entries.len(),
            pages = page,
            "Table of contents fetched"
        );
        Ok(toc)
    }

    async fn fetch_episode_body(&self, ncode: &str, number: u32) -> Result<String, SourceError> {
        let key = format!("{}_{}", ncode, number);
        if let Some(value) = self.cache_get("episode", &key).await {
            if let Some(body) = value.as_str() {
                return Ok(body.to_string());
            }
        }

        self.download_pacer.pace().await;
        let url = format!("{}/{}/{}/", self.config.base_url, ncode, number);
        let html = self.get_text(&url).await?;

        let body = self.extract_episode_body(&html);
        if body.is_empty() {
            tracing::warn!(ncode, number, "No novel text sections found");
        }

        self.cache_put("episode", &key, &serde_json::Value::String(body.clone()))
            .await;

        Ok(body)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.download_pacer.pace().await;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ServiceError(format!("HTTP {} for {}", status, url)));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?
            .to_vec();

        tracing::debug!(url, size = data.len(), "Image fetched");
        Ok(data)
    }
}

/// 最小限の HTML 实体还原
fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

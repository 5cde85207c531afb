//! EPUB Packager - 卷 → EPUB3 文件
//!
//! 实现 BookPackagerPort trait。一卷对应一个 EPUB：
//! mimetype / container.xml / 样式表 / 表紙 / 逐话文档 / nav / OPF，
//! 插图以原始字节嵌入（格式从 magic bytes 判别，不再编码）。
//! 文件名从作品标题・识别码・首末话数导出

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{BookPackagerPort, PackageError, WorkMetadata};
use crate::domain::work::Volume;

use super::xhtml::{
    container_xml, episode_document, episode_file_name, nav_document, package_opf,
    title_page_document, ManifestItem, STYLESHEET,
};
use super::zip_writer::ZipArchiveWriter;

/// 文件名中不可用的字符
const UNSAFE_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// EPUB 打包器
pub struct EpubPackager {
    /// 输出目录（不存在时创建）
    output_dir: PathBuf,
}

impl EpubPackager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 输出文件名：`{作品名}({ncode})_{首话}-{末话}.epub`
    fn file_name(metadata: &WorkMetadata, volume: &Volume) -> Result<String, PackageError> {
        let first = volume
            .first_episode_number()
            .ok_or_else(|| PackageError::InvalidVolume("卷内没有任何话".to_string()))?;
        let last = volume
            .last_episode_number()
            .ok_or_else(|| PackageError::InvalidVolume("卷内没有任何话".to_string()))?;

        let safe_title: String = metadata
            .title
            .chars()
            .filter(|c| !UNSAFE_FILENAME_CHARS.contains(c))
            .collect();
        Ok(format!(
            "{}({})_{}-{}.epub",
            safe_title, metadata.ncode, first, last
        ))
    }
}

#[async_trait]
impl BookPackagerPort for EpubPackager {
    async fn package(
        &self,
        metadata: &WorkMetadata,
        volume: &Volume,
    ) -> Result<PathBuf, PackageError> {
        let file_name = Self::file_name(metadata, volume)?;

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PackageError::IoError(e.to_string()))?;

        let bytes = build_epub(metadata, volume);
        let path = self.output_dir.join(file_name);
        fs::write(&path, &bytes)
            .await
            .map_err(|e| PackageError::IoError(e.to_string()))?;

        tracing::info!(
            volume = volume.number(),
            size = bytes.len(),
            path = %path.display(),
            "EPUB written"
        );
        Ok(path)
    }
}

/// 组装一卷的 EPUB 容器字节列
fn build_epub(metadata: &WorkMetadata, volume: &Volume) -> Vec<u8> {
    let mut zip = ZipArchiveWriter::new();

    // mimetype は仕様上先頭・無圧縮
    zip.add_entry("mimetype", b"application/epub+zip");
    zip.add_entry("META-INF/container.xml", container_xml().as_bytes());
    zip.add_entry("OEBPS/style/default.css", STYLESHEET.as_bytes());

    let mut items: Vec<ManifestItem> = vec![
        ManifestItem {
            id: "style".to_string(),
            href: "style/default.css".to_string(),
            media_type: "text/css".to_string(),
            properties: None,
        },
        ManifestItem {
            id: "nav".to_string(),
            href: "nav.xhtml".to_string(),
            media_type: "application/xhtml+xml".to_string(),
            properties: Some("nav".to_string()),
        },
        ManifestItem {
            id: "titlepage".to_string(),
            href: "titlepage.xhtml".to_string(),
            media_type: "application/xhtml+xml".to_string(),
            properties: None,
        },
    ];
    // 表紙 → 各話の読み順
    let mut spine_idrefs: Vec<String> = vec!["titlepage".to_string()];

    let mut image_count = 0u32;
    for episode in volume.episodes() {
        // 画像を埋め込み、ローカル参照に書き換えたコピーを作る
        let mut body = episode.body().to_string();
        for image in episode.images() {
            image_count += 1;
            let (ext, media_type) = sniff_image_format(image.data());
            let href = format!("images/img_{:04}.{}", image_count, ext);

            zip.add_entry(&format!("OEBPS/{}", href), image.data());
            items.push(ManifestItem {
                id: format!("img_{:04}", image_count),
                href: href.clone(),
                media_type: media_type.to_string(),
                properties: None,
            });
            body = body.replace(image.src(), &href);
        }

        let file = episode_file_name(episode.number());
        let id = format!("ep_{:05}", episode.number());
        let document = episode_document(episode, &body, metadata.total_episodes);

        zip.add_entry(&format!("OEBPS/{}", file), document.as_bytes());
        items.push(ManifestItem {
            id: id.clone(),
            href: file,
            media_type: "application/xhtml+xml".to_string(),
            properties: None,
        });
        spine_idrefs.push(id);
    }

    zip.add_entry(
        "OEBPS/titlepage.xhtml",
        title_page_document(metadata, volume).as_bytes(),
    );
    zip.add_entry("OEBPS/nav.xhtml", nav_document(volume).as_bytes());

    let modified = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let opf = package_opf(metadata, volume, &items, &spine_idrefs, &modified);
    zip.add_entry("OEBPS/content.opf", opf.as_bytes());

    zip.finish()
}

/// 画像形式の判別（magic bytes）
///
/// 不明な形式は JPEG 扱いで埋め込む（再エンコードはしない）
fn sniff_image_format(data: &[u8]) -> (&'static str, &'static str) {
    if data.starts_with(&[0xFF, 0xD8]) {
        ("jpg", "image/jpeg")
    } else if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        ("png", "image/png")
    } else if data.starts_with(b"GIF8") {
        ("gif", "image/gif")
    } else {
        ("jpg", "image/jpeg")
    }
}

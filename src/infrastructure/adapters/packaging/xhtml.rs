//! EPUB 文档生成
//!
//! 纵排样式表与各 XHTML / OPF / nav 文档的字符串组装。
//! 话的正文是上游变换管线产出的可嵌入标记片段，原样嵌入；
//! 标题・作者等元数据经 XML 转义

use crate::application::ports::WorkMetadata;
use crate::domain::work::{Episode, Volume};

/// 纵排样式表
///
/// writing-mode: vertical-rl が縦書きの本体。
/// sesame は傍点、tcy は縦中横（text-combine-upright）
pub const STYLESHEET: &str = r#"@charset "UTF-8";
body {
  writing-mode: vertical-rl;
  -webkit-writing-mode: vertical-rl;
  -epub-writing-mode: vertical-rl;
  line-height: 1.8;
  margin: 0;
  padding: 0;
}
h1 {
  font-size: 1.5em;
  margin-bottom: 2em;
}
h2 {
  font-size: 1.2em;
  margin-bottom: 1em;
}
p {
  text-indent: 1em;
  margin: 0;
}
ruby {
  ruby-position: over;
}
rt {
  font-size: 0.5em;
}
em.sesame {
  font-style: normal;
  text-emphasis-style: filled sesame;
  -webkit-text-emphasis-style: filled sesame;
}
.illustration img {
  max-width: 100%;
  max-height: 90vh;
}
.titlepage {
  text-align: center;
  margin-top: 30%;
}
.titlepage h1 {
  font-size: 1.8em;
  margin-bottom: 1em;
}
.titlepage h2 {
  font-size: 1.3em;
  margin-bottom: 2em;
}
.titlepage .author {
  font-size: 1em;
}
nav.toc {
  margin-top: 2em;
}
nav.toc h2 {
  font-size: 1.2em;
  margin-bottom: 0.5em;
}
nav.toc ol {
  list-style: none;
  padding: 0;
}
nav.toc li {
  margin: 0.3em 0;
}
nav.toc a {
  text-decoration: none;
  color: inherit;
}
.ep-number {
  text-indent: 0;
  font-size: 0.85em;
  color: inherit;
  margin-bottom: 0.2em;
}
.tcy {
  text-combine-upright: all;
  -webkit-text-combine: horizontal;
}
"#;

/// OPF マニフェストの 1 項目
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    /// `properties` 属性（nav 文書の "nav" など）
    pub properties: Option<String>,
}

/// XML 转义（文本・属性值共用）
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 话的文档文件名
pub fn episode_file_name(number: u32) -> String {
    format!("ep_{:05}.xhtml", number)
}

fn xhtml_document(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="ja" lang="ja">
<head>
<title>{title}</title>
<link rel="stylesheet" type="text/css" href="style/default.css" />
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_xml(title),
        body = body,
    )
}

/// container.xml（OPF の所在を指す固定文書）
pub fn container_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#
    .to_string()
}

/// 一话分的文档
///
/// 話番号行（`#N / 全話数`）+ 見出し + 本文
pub fn episode_document(episode: &Episode, body: &str, total_episodes: Option<u32>) -> String {
    let heading = episode.display_title();
    let ep_info = match total_episodes {
        Some(total) => format!("#{} / {}", episode.number(), total),
        None => format!("#{}", episode.number()),
    };
    let content = format!(
        "<p class=\"ep-number\">{}</p>\n<h2>{}</h2>\n{}",
        escape_xml(&ep_info),
        escape_xml(&heading),
        body,
    );
    xhtml_document(&heading, &content)
}

/// 表紙ページ（作品名 + 卷名 + 作者 + 目次リンク）
pub fn title_page_document(metadata: &WorkMetadata, volume: &Volume) -> String {
    let volume_title = full_volume_title(metadata, volume);

    let toc_links: Vec<String> = volume
        .episodes()
        .iter()
        .map(|ep| {
            format!(
                "<li><a href=\"{}\">#{}　{}</a></li>",
                episode_file_name(ep.number()),
                ep.number(),
                escape_xml(&ep.display_title()),
            )
        })
        .collect();

    let subtitle_html = if volume.title().is_empty() {
        String::new()
    } else {
        format!("<h2>{}</h2>", escape_xml(volume.title()))
    };

    let content = format!(
        "<div class=\"titlepage\">\
         <h1>{}</h1>\
         {}\
         <p class=\"author\">{}</p>\
         </div>\
         <nav class=\"toc\">\
         <h2>目次</h2>\
         <ol>{}</ol>\
         </nav>",
        escape_xml(&metadata.title),
        subtitle_html,
        escape_xml(&metadata.writer),
        toc_links.join("\n"),
    );
    xhtml_document(&volume_title, &content)
}

/// EPUB3 nav 文書（読み上げ順の目次）
pub fn nav_document(volume: &Volume) -> String {
    let items: Vec<String> = volume
        .episodes()
        .iter()
        .map(|ep| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                episode_file_name(ep.number()),
                escape_xml(&ep.display_title()),
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="ja" lang="ja">
<head>
<title>目次</title>
</head>
<body>
<nav epub:type="toc">
<h1>目次</h1>
<ol>
{}
</ol>
</nav>
</body>
</html>
"#,
        items.join("\n"),
    )
}

/// OPF パッケージ文書
///
/// 縦書き前提の右綴じ（page-progression-direction="rtl"）、
/// リフロー型レイアウト
pub fn package_opf(
    metadata: &WorkMetadata,
    volume: &Volume,
    items: &[ManifestItem],
    spine_idrefs: &[String],
    modified: &str,
) -> String {
    let identifier = format!("tatebon-{}-vol{}", metadata.ncode, volume.number());
    let volume_title = full_volume_title(metadata, volume);

    let manifest: Vec<String> = items
        .iter()
        .map(|item| {
            let properties = item
                .properties
                .as_ref()
                .map(|p| format!(" properties=\"{}\"", p))
                .unwrap_or_default();
            format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>",
                item.id, item.href, item.media_type, properties,
            )
        })
        .collect();

    let spine: Vec<String> = spine_idrefs
        .iter()
        .map(|idref| format!("    <itemref idref=\"{}\"/>", idref))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="bookid" xml:lang="ja">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="bookid">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>ja</dc:language>
    <dc:creator>{creator}</dc:creator>
    <meta property="dcterms:modified">{modified}</meta>
    <meta property="rendition:layout">reflowable</meta>
  </metadata>
  <manifest>
{manifest}
  </manifest>
  <spine page-progression-direction="rtl">
{spine}
  </spine>
</package>
"#,
        identifier = escape_xml(&identifier),
        title = escape_xml(&volume_title),
        creator = escape_xml(&metadata.writer),
        modified = modified,
        manifest = manifest.join("\n"),
        spine = spine.join("\n"),
    )
}

/// 卷の完全タイトル：作品名 + 卷タイトル（設定時のみ）
fn full_volume_title(metadata: &WorkMetadata, volume: &Volume) -> String {
    if volume.title().is_empty() {
        metadata.title.clone()
    } else {
        format!("{} {}", metadata.title, volume.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> WorkMetadata {
        WorkMetadata {
            ncode: "n1234ab".to_string(),
            title: "空と<海>".to_string(),
            writer: "作者 & 助手".to_string(),
            total_episodes: Some(120),
        }
    }

    fn volume() -> Volume {
        let mut ep = Episode::new(5, "出発", None).unwrap();
        ep.set_body("<p>本文</p>".to_string());
        Volume::new(2, vec![ep])
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"a<b>&"c'"#),
            "a&lt;b&gt;&amp;&quot;c&#39;"
        );
    }

    #[test]
    fn test_episode_document_carries_number_line_and_heading() {
        let ep = Episode::new(5, "出発", None).unwrap();
        let doc = episode_document(&ep, "<p>本文</p>", Some(120));

        assert!(doc.contains("<p class=\"ep-number\">#5 / 120</p>"));
        assert!(doc.contains("<h2>出発</h2>"));
        assert!(doc.contains("<p>本文</p>"));
        assert!(!doc.contains("writing-mode")); // CSS は別ファイル参照
        assert!(doc.contains("style/default.css"));
    }

    #[test]
    fn test_episode_document_without_total() {
        let ep = Episode::new(7, "", None).unwrap();
        let doc = episode_document(&ep, "", None);

        assert!(doc.contains("<p class=\"ep-number\">#7</p>"));
        assert!(doc.contains("<h2>第7話</h2>"));
    }

    #[test]
    fn test_title_page_links_all_episodes_and_escapes() {
        let doc = title_page_document(&metadata(), &volume());

        assert!(doc.contains("<h1>空と&lt;海&gt;</h1>"));
        assert!(doc.contains("<p class=\"author\">作者 &amp; 助手</p>"));
        assert!(doc.contains("<a href=\"ep_00005.xhtml\">#5　出発</a>"));
        // 卷タイトル未設定 → サブタイトル行なし
        assert!(!doc.contains("<h2></h2>"));
    }

    #[test]
    fn test_title_page_shows_volume_subtitle_when_set() {
        let mut vol = volume();
        vol.set_title("中編");
        let doc = title_page_document(&metadata(), &vol);

        assert!(doc.contains("<h2>中編</h2>"));
        assert!(doc.contains("<title>空と&lt;海&gt; 中編</title>"));
    }

    #[test]
    fn test_package_opf_structure() {
        let items = vec![
            ManifestItem {
                id: "nav".to_string(),
                href: "nav.xhtml".to_string(),
                media_type: "application/xhtml+xml".to_string(),
                properties: Some("nav".to_string()),
            },
            ManifestItem {
                id: "ep_00005".to_string(),
                href: "ep_00005.xhtml".to_string(),
                media_type: "application/xhtml+xml".to_string(),
                properties: None,
            },
        ];
        let spine = vec!["ep_00005".to_string()];
        let opf = package_opf(&metadata(), &volume(), &items, &spine, "2024-01-01T00:00:00Z");

        assert!(opf.contains("<dc:identifier id=\"bookid\">tatebon-n1234ab-vol2</dc:identifier>"));
        assert!(opf.contains("page-progression-direction=\"rtl\""));
        assert!(opf.contains("<dc:language>ja</dc:language>"));
        assert!(opf.contains("properties=\"nav\""));
        assert!(opf.contains("<itemref idref=\"ep_00005\"/>"));
        assert!(opf.contains("rendition:layout"));
    }

    #[test]
    fn test_nav_document_lists_episodes() {
        let doc = nav_document(&volume());
        assert!(doc.contains("epub:type=\"toc\""));
        assert!(doc.contains("<a href=\"ep_00005.xhtml\">出発</a>"));
    }
}

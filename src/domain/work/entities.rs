//! Work Context - Entities

use serde::{Deserialize, Serialize};

use super::WorkError;

/// 插图资源描述符
///
/// 对核心层不透明：src 是正文中出现的引用，data 是下载到的原始字节，
/// 核心层既不解码也不改写，由打包适配器负责嵌入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeImage {
    /// 正文中的原始 src 引用
    src: String,
    /// 图片原始字节
    data: Vec<u8>,
}

impl EpisodeImage {
    pub fn new(src: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            src: src.into(),
            data,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// 话（エピソード）- 作品的最小组成单位
///
/// 不变量:
/// - number 为正整数，在作品内唯一且按输入顺序严格递增
/// - 核心层只会替换 body，从不删除或重排话与插图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// 话数（1 起）
    number: u32,
    /// 话标题（可为空）
    title: String,
    /// 所属章节标签，None 表示不属于任何章节
    chapter: Option<String>,
    /// 正文（可含标记）
    body: String,
    /// 插图列表
    images: Vec<EpisodeImage>,
}

impl Episode {
    pub fn new(
        number: u32,
        title: impl Into<String>,
        chapter: Option<String>,
    ) -> Result<Self, WorkError> {
        if number == 0 {
            return Err(WorkError::InvalidEpisodeNumber(number));
        }
        Ok(Self {
            number,
            title: title.into(),
            chapter,
            body: String::new(),
            images: Vec::new(),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chapter(&self) -> Option<&str> {
        self.chapter.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 正文的 UTF-8 字节长度（分卷判定用的原始尺寸）
    pub fn body_size_bytes(&self) -> u64 {
        self.body.len() as u64
    }

    /// 替换正文（变换管线写回转换结果）
    pub fn set_body(&mut self, body: String) {
        self.body = body;
    }

    pub fn images(&self) -> &[EpisodeImage] {
        &self.images
    }

    pub fn set_images(&mut self, images: Vec<EpisodeImage>) {
        self.images = images;
    }

    /// 展示用标题：空标题回退为「第N話」
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            format!("第{}話", self.number)
        } else {
            self.title.clone()
        }
    }
}

/// 卷 - 一个有界的输出单位
///
/// 不变量:
/// - number 从 1 起连续编号
/// - episodes 是输入话列表的连续子序列，各卷互不重叠，
///   全部卷拼接等于输入列表本身（划分而非变换）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// 卷号（1 起，由分卷算法顺序分配）
    number: u32,
    /// 卷标题（分卷后为空，由调用方按需填写）
    title: String,
    /// 本卷包含的话，保持输入顺序
    episodes: Vec<Episode>,
}

impl Volume {
    pub fn new(number: u32, episodes: Vec<Episode>) -> Self {
        Self {
            number,
            title: String::new(),
            episodes,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// 本卷第一话的话数（打包器命名用）
    pub fn first_episode_number(&self) -> Option<u32> {
        self.episodes.first().map(|e| e.number())
    }

    /// 本卷最后一话的话数（打包器命名用）
    pub fn last_episode_number(&self) -> Option<u32> {
        self.episodes.last().map(|e| e.number())
    }

    /// 本卷正文的原始尺寸合计
    pub fn raw_size_bytes(&self) -> u64 {
        self.episodes.iter().map(|e| e.body_size_bytes()).sum()
    }
}

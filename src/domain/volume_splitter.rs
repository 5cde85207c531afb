//! 分卷算法
//!
//! 把有序的话列表按原始字节尺寸预算划分为若干卷。
//! 默认整部作品一卷；超出阈值时优先在章节边界分割，
//! 无章节的作品退化为按话数近似均分。
//!
//! 阈值是软性打包目标而非硬上限：单章超过阈值时整章仍进同一卷，
//! 绝不从章节中间切开

use std::collections::HashMap;

use crate::domain::work::{Episode, Volume};

/// 按卷划分话列表
///
/// - `chapters`: 章节标签，首次出现顺序，可为空
/// - `episodes`: 全部话，输入顺序即最终顺序
/// - `threshold_bytes`: 每卷正文的原始 UTF-8 字节预算；
///   0 被钳制为 1，避免按话数均分路径出现除零
///
/// 返回的卷从 1 起连续编号、标题为空，全部卷的话拼接
/// 恒等于输入列表（划分律）
pub fn split_into_volumes(
    chapters: &[String],
    episodes: Vec<Episode>,
    threshold_bytes: u64,
) -> Vec<Volume> {
    if episodes.is_empty() {
        return Vec::new();
    }

    let threshold = threshold_bytes.max(1);
    let total_size: u64 = episodes.iter().map(|e| e.body_size_bytes()).sum();

    // 收まるなら 1 卷
    if total_size <= threshold {
        return vec![Volume::new(1, episodes)];
    }

    let groups = if chapters.is_empty() {
        split_evenly(episodes, total_size, threshold)
    } else {
        split_at_chapter_bounds(chapters, episodes, threshold)
    };

    groups
        .into_iter()
        .enumerate()
        .map(|(i, eps)| Volume::new(i as u32 + 1, eps))
        .collect()
}

/// 章节边界分割
///
/// 按章节标签顺序打包：加入某章会超出阈值且当前卷非空时，
/// 先封卷再开新卷；无章节标签的话收进末尾的附加卷
fn split_at_chapter_bounds(
    chapters: &[String],
    episodes: Vec<Episode>,
    threshold: u64,
) -> Vec<Vec<Episode>> {
    // 按章节标签分组，组内保持输入顺序
    let mut grouped: HashMap<Option<String>, Vec<Episode>> = HashMap::new();
    for episode in episodes {
        let key = episode.chapter().map(str::to_owned);
        grouped.entry(key).or_default().push(episode);
    }

    let mut volumes: Vec<Vec<Episode>> = Vec::new();
    let mut current: Vec<Episode> = Vec::new();
    let mut current_size: u64 = 0;

    for label in chapters {
        let Some(chapter_eps) = grouped.remove(&Some(label.clone())) else {
            // 該当話のない章はスキップ
            continue;
        };
        let chapter_size: u64 = chapter_eps.iter().map(|e| e.body_size_bytes()).sum();

        if !current.is_empty() && current_size + chapter_size > threshold {
            volumes.push(std::mem::take(&mut current));
            current_size = 0;
        }

        current.extend(chapter_eps);
        current_size += chapter_size;
    }

    if !current.is_empty() {
        volumes.push(current);
    }

    // 章节に属さない話は末尾の 1 卷にまとめる（サイズ不問）
    if let Some(no_chapter) = grouped.remove(&None) {
        if !no_chapter.is_empty() {
            volumes.push(no_chapter);
        }
    }

    volumes
}

/// 无章节时的按话数均分
///
/// 只按话数切块，不看每卷字节数，单卷可能高于或低于阈值，
/// 是对无章节作品可接受的近似
fn split_evenly(episodes: Vec<Episode>, total_size: u64, threshold: u64) -> Vec<Vec<Episode>> {
    let num_volumes = (total_size / threshold) as usize + 1;
    let per_volume = episodes.len() / num_volumes + 1;

    let mut volumes = Vec::new();
    let mut iter = episodes.into_iter().peekable();
    while iter.peek().is_some() {
        let chunk: Vec<Episode> = iter.by_ref().take(per_volume).collect();
        volumes.push(chunk);
    }

    volumes
}

//! 半角字形的纵排转换
//!
//! 只处理标记之外的文本段（见 [`tokenizer`]），以 ASCII
//! 连续段（字母/数字/少量标点/空格的最大连续段）为单位改写:
//!
//! - 含字母且是「英文句子」的段（空格分隔的 2 个以上单词，
//!   或 8 字符以上）：整段原样保留，段内数字也不动，
//!   保证夹杂的外语句子可读且再次转换不产生变化
//! - 含字母的短段：每个字母映射为全角，段内数字交给数字规则
//! - 数字连续段：恰好 2 位 → 原样包进縦中横 `<span class="tcy">`
//!   （年龄、话数等 2 位数在纵排里直立更易读）；
//!   1 位或 3 位以上 → 逐字映射为全角
//!
//! 已经包在縦中横 span 里的文本不再处理，全角字形也不会被
//! ASCII 模式再次命中，英文段则整段保持原状，
//! 因此转换是幂等的
//!
//! [`tokenizer`]: super::tokenizer

use regex::{Captures, Regex};

use super::pipeline::RewriteStage;
use super::tokenizer::{tokenize, Token};

/// 縦中横 span 的开闭标记
const COMBINE_OPEN: &str = "<span class=\"tcy\">";
const COMBINE_CLOSE: &str = "</span>";

/// ASCII 0x21-0x7E → 对应全角字形（U+FEE0 偏移）
fn to_fullwidth(c: char) -> char {
    char::from_u32(c as u32 + 0xFEE0).unwrap_or(c)
}

/// 英文句子判定：2 个以上空格分隔的单词，或 8 字符以上
fn is_prose_run(run: &str) -> bool {
    run.split_whitespace().count() >= 2 || run.len() >= 8
}

fn convert_digit_run(run: &str) -> String {
    if run.len() == 2 {
        format!("{COMBINE_OPEN}{run}{COMBINE_CLOSE}")
    } else {
        run.chars().map(to_fullwidth).collect()
    }
}

/// 字形转换器
pub struct GlyphConverter {
    /// 半角英数・记号的连续段（英文检测用，空格含む）
    ascii_run: Regex,
    /// 半角数字的连续段
    digit_run: Regex,
}

impl GlyphConverter {
    pub fn new() -> Self {
        Self {
            ascii_run: Regex::new(r#"[a-zA-Z0-9_.,!?'" &:;-]+"#).expect("固定模式必然编译通过"),
            digit_run: Regex::new(r"[0-9]+").expect("固定模式必然编译通过"),
        }
    }

    /// 转换一段正文中全部标记外文本
    pub fn convert(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut in_combined = false;

        for token in tokenize(input) {
            match token {
                Token::Markup(markup) => {
                    if markup == COMBINE_OPEN {
                        in_combined = true;
                    } else if in_combined && markup == COMBINE_CLOSE {
                        in_combined = false;
                    }
                    out.push_str(markup);
                }
                Token::Text(text) => {
                    if in_combined {
                        // 既に縦中横化済み、再処理しない
                        out.push_str(text);
                    } else {
                        out.push_str(&self.convert_segment(text));
                    }
                }
            }
        }

        out
    }

    /// 单个文本段的改写
    fn convert_segment(&self, text: &str) -> String {
        self.ascii_run
            .replace_all(text, |caps: &Captures| self.convert_ascii_run(&caps[0]))
            .into_owned()
    }

    /// 单个 ASCII 连续段的改写
    ///
    /// 英文段整段保留（数字含む）；其余先全角化字母，
    /// 再处理残留的数字连续段
    fn convert_ascii_run(&self, run: &str) -> String {
        let has_letter = run.bytes().any(|b| b.is_ascii_alphabetic());
        if has_letter && is_prose_run(run) {
            return run.to_string();
        }

        let mapped: String = if has_letter {
            run.chars()
                .map(|c| if c.is_ascii_alphabetic() { to_fullwidth(c) } else { c })
                .collect()
        } else {
            run.to_string()
        };

        self.digit_run
            .replace_all(&mapped, |caps: &Captures| convert_digit_run(&caps[0]))
            .into_owned()
    }
}

impl Default for GlyphConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteStage for GlyphConverter {
    fn name(&self) -> &'static str {
        "glyph"
    }

    fn apply(&self, input: &str) -> String {
        self.convert(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_digit_run_becomes_fullwidth() {
        let converter = GlyphConverter::new();
        assert_eq!(converter.convert("2024年"), "２０２４年");
        assert_eq!(converter.convert("第3話"), "第３話");
    }

    #[test]
    fn test_two_digit_run_becomes_tcy() {
        let converter = GlyphConverter::new();
        assert_eq!(
            converter.convert("42歳"),
            "<span class=\"tcy\">42</span>歳"
        );
    }

    #[test]
    fn test_prose_run_kept_as_is() {
        let converter = GlyphConverter::new();
        assert_eq!(converter.convert("Hello there"), "Hello there");
        // 8 文字以上の単語も英文扱い
        assert_eq!(converter.convert("Deadline"), "Deadline");
    }

    #[test]
    fn test_short_letter_run_becomes_fullwidth() {
        let converter = GlyphConverter::new();
        assert_eq!(converter.convert("OK"), "ＯＫ");
        assert_eq!(converter.convert("Aボタン"), "Ａボタン");
    }

    #[test]
    fn test_short_run_digits_handled_by_digit_rule() {
        // 短段内の記号はそのまま、数字は数字規則が引き取る
        let converter = GlyphConverter::new();
        assert_eq!(converter.convert("No.1"), "Ｎｏ.１");
        assert_eq!(
            converter.convert("Lv.42"),
            "Ｌｖ.<span class=\"tcy\">42</span>"
        );
    }

    #[test]
    fn test_digits_inside_prose_stay_with_the_prose() {
        // 英文段は数字も含めて一切触らない
        let converter = GlyphConverter::new();
        assert_eq!(converter.convert("Hello there 42"), "Hello there 42");
        assert_eq!(converter.convert("Chapter 12 begins"), "Chapter 12 begins");
    }

    #[test]
    fn test_text_inside_markup_untouched() {
        let converter = GlyphConverter::new();
        assert_eq!(
            converter.convert("<img src=\"photo42.jpg\" />"),
            "<img src=\"photo42.jpg\" />"
        );
    }

    #[test]
    fn test_segments_between_tags_converted() {
        let converter = GlyphConverter::new();
        assert_eq!(
            converter.convert("<p>12月24日</p>"),
            "<p><span class=\"tcy\">12</span>月<span class=\"tcy\">24</span>日</p>"
        );
    }

    #[test]
    fn test_tcy_span_not_rewrapped() {
        let converter = GlyphConverter::new();
        let once = converter.convert("42歳と7歳");
        assert_eq!(converter.convert(&once), once);
    }

    #[test]
    fn test_conversion_is_stable() {
        let converter = GlyphConverter::new();
        for input in [
            "2024年、OK、No.1",
            "Hello there 42 and more",
            "Lv.42 の魔物",
            "A2 と 12月",
        ] {
            let once = converter.convert(input);
            assert_eq!(converter.convert(&once), once, "input: {input}");
        }
    }
}

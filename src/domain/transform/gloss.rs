//! ルビ・傍点记法改写
//!
//! 把なろう记法改写为显式标记，固定顺序执行三条规则:
//!
//! 1. 傍点 `《《対象》》` → `<em class="sesame">対象</em>`
//!    （必须最先执行，否则外侧的双重书名号会被下面的ルビ规则吃掉）
//! 2. 明示ルビ `｜親文字《ルビ》` → `<ruby>親文字<rp>（</rp><rt>ルビ</rt><rp>）</rp></ruby>`
//!    （`<rp>` 括号保证不支持 ruby 的阅读器仍显示「親文字（ルビ）」）
//! 3. 自动ルビ `漢字《ルビ》`（无分隔符，親文字仅限汉字类字符）→ 同上
//!    （必须在 2 之后执行，明示指定的親文字可以含非汉字字符）
//!
//! 不成对、不平衡的括号原样保留，改写永不失败

use regex::{Captures, Regex};

use super::pipeline::RewriteStage;

/// 汉字类字符：CJK 统一汉字（含扩展A）+ 兼容汉字 + 々〇〻
const RUBY_TARGET: &str = r"[\x{3400}-\x{9FFF}\x{F900}-\x{FAFF}々〇〻]";

fn ruby_tag(base: &str, ruby: &str) -> String {
    format!("<ruby>{base}<rp>（</rp><rt>{ruby}</rt><rp>）</rp></ruby>")
}

/// 记法改写器
///
/// 正则在构造时编译一次，之后按话复用
pub struct GlossAnnotator {
    /// `《《傍点対象》》`
    sesame: Regex,
    /// `｜親文字《ルビ》`（明示指定，半角 `|` 也接受）
    explicit_ruby: Regex,
    /// `漢字《ルビ》`（自动检测）
    auto_ruby: Regex,
}

impl GlossAnnotator {
    pub fn new() -> Self {
        Self {
            sesame: Regex::new(r"《《(.+?)》》").expect("固定模式必然编译通过"),
            explicit_ruby: Regex::new(r"[｜|](.+?)《(.+?)》").expect("固定模式必然编译通过"),
            auto_ruby: Regex::new(&format!(r"({RUBY_TARGET}+)《(.+?)》"))
                .expect("固定模式必然编译通过"),
        }
    }

    /// 改写一段正文中的全部记法
    pub fn annotate(&self, text: &str) -> String {
        // 傍点最先处理，防止《《》》被《》误匹配
        let text = self
            .sesame
            .replace_all(text, "<em class=\"sesame\">${1}</em>");
        let text = self
            .explicit_ruby
            .replace_all(&text, |caps: &Captures| ruby_tag(&caps[1], &caps[2]));
        let text = self
            .auto_ruby
            .replace_all(&text, |caps: &Captures| ruby_tag(&caps[1], &caps[2]));
        text.into_owned()
    }
}

impl Default for GlossAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteStage for GlossAnnotator {
    fn name(&self) -> &'static str {
        "gloss"
    }

    fn apply(&self, input: &str) -> String {
        self.annotate(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_ruby() {
        let annotator = GlossAnnotator::new();
        assert_eq!(
            annotator.annotate("｜新宿《しんじゅく》"),
            "<ruby>新宿<rp>（</rp><rt>しんじゅく</rt><rp>）</rp></ruby>"
        );
    }

    #[test]
    fn test_explicit_ruby_ascii_delimiter() {
        let annotator = GlossAnnotator::new();
        assert_eq!(
            annotator.annotate("|ベル《鐘》"),
            "<ruby>ベル<rp>（</rp><rt>鐘</rt><rp>）</rp></ruby>"
        );
    }

    #[test]
    fn test_auto_ruby_on_kanji_run() {
        let annotator = GlossAnnotator::new();
        assert_eq!(
            annotator.annotate("東京《とうきょう》へ行く"),
            "<ruby>東京<rp>（</rp><rt>とうきょう</rt><rp>）</rp></ruby>へ行く"
        );
    }

    #[test]
    fn test_auto_ruby_includes_iteration_marks() {
        let annotator = GlossAnnotator::new();
        assert_eq!(
            annotator.annotate("日々《ひび》"),
            "<ruby>日々<rp>（</rp><rt>ひび</rt><rp>）</rp></ruby>"
        );
    }

    #[test]
    fn test_auto_ruby_does_not_match_kana_base() {
        // 親文字が仮名のみ → 自動ルビ対象外
        let annotator = GlossAnnotator::new();
        assert_eq!(annotator.annotate("ひらがな《よみ》"), "ひらがな《よみ》");
    }

    #[test]
    fn test_sesame_emphasis() {
        let annotator = GlossAnnotator::new();
        assert_eq!(
            annotator.annotate("《《強調》》"),
            "<em class=\"sesame\">強調</em>"
        );
    }

    #[test]
    fn test_sesame_runs_before_ruby() {
        // 傍点対象が漢字でも、外側の《《》》が先に消費される
        let annotator = GlossAnnotator::new();
        assert_eq!(
            annotator.annotate("《《漢字》》"),
            "<em class=\"sesame\">漢字</em>"
        );
    }

    #[test]
    fn test_unbalanced_brackets_pass_through() {
        let annotator = GlossAnnotator::new();
        assert_eq!(annotator.annotate("《とじない"), "《とじない");
        assert_eq!(annotator.annotate("｜親文字だけ"), "｜親文字だけ");
    }

    #[test]
    fn test_mixed_notations_in_one_line() {
        let annotator = GlossAnnotator::new();
        let got = annotator.annotate("｜彼《かれ》は《《走った》》、東京《とうきょう》まで。");
        assert_eq!(
            got,
            "<ruby>彼<rp>（</rp><rt>かれ</rt><rp>）</rp></ruby>は\
             <em class=\"sesame\">走った</em>、\
             <ruby>東京<rp>（</rp><rt>とうきょう</rt><rp>）</rp></ruby>まで。"
        );
    }

    #[test]
    fn test_rewritten_output_is_stable() {
        let annotator = GlossAnnotator::new();
        let once = annotator.annotate("｜新宿《しんじゅく》と東京《とうきょう》");
        assert_eq!(annotator.annotate(&once), once);
    }
}

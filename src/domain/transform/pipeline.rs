//! 正文变换管线
//!
//! 把记法改写与字形转换编排为显式的有序阶段列表，
//! 阶段间的先后依赖是可见契约而非偶然的代码顺序

use super::gloss::GlossAnnotator;
use super::glyph::GlyphConverter;

/// 纯文本改写阶段
///
/// 每个阶段是输入字符串到输出字符串的全函数，
/// 对任意输入都不失败（不匹配即原样透传）
pub trait RewriteStage: Send + Sync {
    /// 阶段名（日志与诊断用）
    fn name(&self) -> &'static str;

    fn apply(&self, input: &str) -> String;
}

/// 正文变换器
///
/// 阶段顺序固定:
///
/// 1. `gloss` - 前置条件：原始记法尚未改写。
///    后置条件：记法已变为标记，正文中不再有可匹配的
///    `《《…》》` / `｜…《…》` / `漢字《…》` 残留
/// 2. `glyph` - 前置条件：标记边界已最终确定（gloss 产出的
///    ruby/em 标记参与文本段切分）。
///    后置条件：标记外的 ASCII 连续段已按纵排规则重排
///
/// 对整体而言 `transform(transform(x)) == transform(x)` 成立:
/// gloss 消费掉分隔符后二次执行是空操作，glyph 的产物
/// （全角字形、縦中横 span）不会被自身的模式再次命中
pub struct TextTransformer {
    stages: Vec<Box<dyn RewriteStage>>,
}

impl TextTransformer {
    pub fn new() -> Self {
        Self {
            stages: vec![
                Box::new(GlossAnnotator::new()),
                Box::new(GlyphConverter::new()),
            ],
        }
    }

    /// 变换一话的正文
    ///
    /// 从不失败：畸形记法、畸形标记都退化为原样透传
    pub fn transform(&self, body: &str) -> String {
        self.stages
            .iter()
            .fold(body.to_string(), |text, stage| stage.apply(&text))
    }

    /// 阶段名列表（按执行顺序）
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for TextTransformer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_gloss_then_glyph() {
        let transformer = TextTransformer::new();
        assert_eq!(transformer.stage_names(), vec!["gloss", "glyph"]);
    }

    #[test]
    fn test_full_pipeline() {
        let transformer = TextTransformer::new();
        let got = transformer.transform("｜彼女《ヒロイン》は17歳、《《今日》》が誕生日。");
        assert_eq!(
            got,
            "<ruby>彼女<rp>（</rp><rt>ヒロイン</rt><rp>）</rp></ruby>は\
             <span class=\"tcy\">17</span>歳、\
             <em class=\"sesame\">今日</em>が誕生日。"
        );
    }

    #[test]
    fn test_glyph_pass_applies_inside_ruby_reading() {
        // <rt> 内の読みもタグ外テキストとして字形変換の対象になる
        let transformer = TextTransformer::new();
        let got = transformer.transform("｜第一章《だい1しょう》");
        assert_eq!(
            got,
            "<ruby>第一章<rp>（</rp><rt>だい１しょう</rt><rp>）</rp></ruby>"
        );
    }

    #[test]
    fn test_malformed_input_passes_through() {
        let transformer = TextTransformer::new();
        assert_eq!(transformer.transform("《とじない括弧"), "《とじない括弧");
        assert_eq!(transformer.transform(""), "");
    }

    #[test]
    fn test_transform_is_idempotent() {
        let transformer = TextTransformer::new();
        for input in [
            "｜新宿《しんじゅく》で42歳のOKさんと2024年に会う",
            "《《強調》》と東京《とうきょう》",
            "Hello there 42 and <p>12月</p>",
            "畸形<途中 と 《閉じない",
        ] {
            let once = transformer.transform(input);
            let twice = transformer.transform(&once);
            assert_eq!(twice, once, "input: {input}");
        }
    }
}

//! 标记分词器
//!
//! 把输入切成「标记 token」与「文本 token」的有序序列，使得
//! 字形转换只作用于标记之外的文本成为显式契约。
//!
//! 规则:
//! - `<` 开启一个标记 token，延伸到下一个 `>`（含）；
//!   没有闭合 `>` 时延伸到输入末尾
//! - 文本 token 是不含 `<`、`>` 的最大连续段
//! - 游离的 `>` 自成一个单字符标记 token
//!
//! 已知局限：属性值内出现的尖括号会被当作标记边界，
//! 这里不做属性级解析

/// 分词结果中的一段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// 标记段（含两端尖括号），原样透传
    Markup(&'a str),
    /// 标记之外的文本段，是字形转换的作用对象
    Text(&'a str),
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Markup(s) | Token::Text(s) => s,
        }
    }
}

/// 按标记边界分词
///
/// 所有 token 按原文顺序拼接恒等于输入（无损切分）
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        match rest.find(['<', '>']) {
            None => {
                tokens.push(Token::Text(rest));
                break;
            }
            Some(pos) => {
                if pos > 0 {
                    tokens.push(Token::Text(&rest[..pos]));
                }
                let after = &rest[pos..];
                if after.starts_with('>') {
                    // 游离的闭尖括号
                    tokens.push(Token::Markup(&after[..1]));
                    rest = &after[1..];
                } else {
                    match after.find('>') {
                        Some(end) => {
                            tokens.push(Token::Markup(&after[..=end]));
                            rest = &after[end + 1..];
                        }
                        None => {
                            // 未闭合的标记，保守地吞到末尾
                            tokens.push(Token::Markup(after));
                            rest = "";
                        }
                    }
                }
            }
        }
    }

    tokens
}

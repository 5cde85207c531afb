//! 正文变换 - 纵排化的纯文本改写
//!
//! 职责:
//! - なろう记法（ルビ・傍点）→ 显式标记
//! - 半角英数 → 纵排友好的全角/縦中横
//! - 两者编排为固定顺序的改写管线
//!
//! 全部操作是同步纯函数，无 I/O、无共享状态，
//! 不同话之间可以并发调用

mod gloss;
mod glyph;
mod pipeline;
mod tokenizer;

pub use gloss::GlossAnnotator;
pub use glyph::GlyphConverter;
pub use pipeline::{RewriteStage, TextTransformer};
pub use tokenizer::{tokenize, Token};

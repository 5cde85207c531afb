//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod narou;
pub mod packaging;

pub use narou::*;
pub use packaging::*;

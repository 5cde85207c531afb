//! 应用层 - 命令
//!
//! 一次转换运行的编排入口

mod build_commands;

pub mod handlers;

pub use build_commands::*;

//! Command Handlers 实现

mod build_handlers;

pub use build_handlers::*;

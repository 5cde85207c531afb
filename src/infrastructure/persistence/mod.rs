//! Persistence Layer - 页面缓存持久化

mod json_page_cache;

pub use json_page_cache::JsonPageCache;

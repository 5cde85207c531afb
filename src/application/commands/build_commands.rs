//! Build Commands - 变换・打包命令

/// 生成一部作品的纵排 EPUB 命令
#[derive(Debug, Clone)]
pub struct BuildBook {
    /// 作品识别码（N コード）
    pub ncode: String,
    /// 开始话数（含），None 表示从头
    pub start: Option<u32>,
    /// 结束话数（含），None 表示到末尾
    pub end: Option<u32>,
}

/// 清除页面缓存命令
#[derive(Debug, Clone)]
pub struct ClearCache {
    /// 指定时只清除该作品的条目
    pub ncode: Option<String>,
}

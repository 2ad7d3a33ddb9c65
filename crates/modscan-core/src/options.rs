//! 运行选项与统计信息（模块）
use std::time::Duration;

/// 批量重审扫描选项
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
    /// 目录遍历深度（1 表示只扫描顶层文件）
    pub max_depth: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { max_file_size: None, threads: None, max_depth: 1 }
    }
}

/// 批量扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    /// 决策不是 pass 的文件数
    pub files_flagged: usize,
    pub outputs_written: usize,
}

/// 滑动窗口限流配置：每个客户端在 `window` 内最多 `max_hits` 次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub window: Duration,
    pub max_hits: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { window: Duration::from_secs(60), max_hits: 30 }
    }
}

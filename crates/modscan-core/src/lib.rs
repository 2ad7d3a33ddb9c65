//! 内容审核文本扫描核心库
//!
//! 数据流：原文 → 归一化 → 按规则字典匹配 → 合并重叠命中 → {高亮预览 | 放行/复核/拦截决策}
//!
//! 设计要点：
//! - 全部阶段均为纯函数、同步、无共享可变状态，可跨请求并发调用；
//! - 规则在加载时一次性编译，非法正则只拒绝该条规则并记录日志；
//! - 命中偏移相对于归一化文本，渲染预览时经偏移映射回写原文位置；
//! - 用户文本输出前一律做 HTML 转义。

mod batch;
mod decision;
mod detectors;
mod engine;
mod error;
mod findings;
mod gate;
mod highlight;
mod normalize;
mod options;
mod rules;
mod scan;
mod throttle;
mod types;

pub use batch::{scan_dir_and_write, FileVerdict};
pub use decision::{decide, DecisionPolicy};
pub use detectors::{CompiledDictionary, CompiledRule, LiteralFinder, RuleKind};
pub use error::{DictionaryError, GateError, ParseDecisionError, RuleCompileError};
pub use findings::resolve;
pub use gate::{
    DictionarySource, FileSource, Moderator, PrecheckRequest, PrecheckResponse, PreviewRequest,
    PreviewResponse, StaticSource, SubmissionKind,
};
pub use highlight::{escape_html, highlight, marker_color};
pub use normalize::{normalize, normalize_with_offsets, Normalized, OffsetMap};
pub use options::{BatchOptions, BatchStats, ThrottleConfig};
pub use rules::{PolicyConfig, RuleEntry, RuleFile};
pub use scan::{match_rules, scan, ScanResult};
pub use throttle::SlidingWindowLimiter;
pub use types::{Decision, Match, Run, Severity, Span};

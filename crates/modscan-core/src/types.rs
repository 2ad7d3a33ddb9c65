//! 公共类型（对外暴露）：严重级别、命中区间、合并后的高亮段与决策结果
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseDecisionError;

/// 规则严重级别
/// - 以有序枚举表达 `low < medium < high`，比较与取最大值由类型系统保证，
///   不依赖字符串字典序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审核决策：pass（放行）/ review（人工复核）/ block（拦截）
/// 变体顺序即严格程度，`Ord` 可直接用于单调性比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Pass,
    Review,
    Block,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Pass => "pass",
            Decision::Review => "review",
            Decision::Block => "block",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 命令行等外部输入按名称解析决策（忽略大小写与首尾空白）
impl FromStr for Decision {
    type Err = ParseDecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(Decision::Pass),
            "review" => Ok(Decision::Review),
            "block" => Ok(Decision::Block),
            _ => Err(ParseDecisionError(s.to_string())),
        }
    }
}

/// 单次命中区间（归一化文本上的字节偏移，半开区间，`start < end`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start < end, "span must be non-empty");
        Self { start, end }
    }
}

/// 单条规则的全部命中（每条规则至多一条记录，区间升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub rule_id: String,
    pub pattern: String,
    pub severity: Severity,
    pub spans: Vec<Span>,
}

/// 合并后的高亮段：互不相交，按 start 升序，severity 取所有贡献区间的最大值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    pub start: usize,
    pub end: usize,
    pub severity: Severity,
}

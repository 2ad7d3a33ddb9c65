//! 扫描结果与便捷入口
use serde::Serialize;

use crate::detectors::CompiledDictionary;
use crate::findings::merge_runs;
use crate::normalize::{normalize, Normalized};
use crate::rules::RuleEntry;
use crate::types::{Match, Run, Severity};

/// 单次扫描结果
/// - `matches` / `runs` 的偏移均相对于归一化文本；
/// - `highest_severity` 为 None 当且仅当 `runs` 为空；
/// - 原文偏移请用 `original_runs()`。
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub matches: Vec<Match>,
    pub runs: Vec<Run>,
    pub highest_severity: Option<Severity>,
    #[serde(skip)]
    pub(crate) normalized: Normalized,
}

impl ScanResult {
    pub fn empty() -> Self {
        Self {
            matches: Vec::new(),
            runs: Vec::new(),
            highest_severity: None,
            normalized: Normalized::default(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.runs.is_empty()
    }

    /// 参与匹配的归一化文本
    pub fn normalized_text(&self) -> &str {
        &self.normalized.text
    }

    /// 归一化偏移能否精确映射回原文
    pub fn is_aligned(&self) -> bool {
        self.normalized.map.is_aligned()
    }

    /// 将高亮段映射回原文字节偏移（映射后相接的段再次合并）
    pub fn original_runs(&self) -> Vec<Run> {
        let mapped = self
            .runs
            .iter()
            .filter_map(|r| {
                let (start, end) = self.normalized.map.to_original(r.start, r.end);
                (end > start).then_some(Run { start, end, severity: r.severity })
            })
            .collect();
        merge_runs(mapped)
    }
}

/// 即时编译规则并扫描（每次调用都会编译；高频场景请复用 `CompiledDictionary`）
pub fn scan(text: &str, rules: &[RuleEntry]) -> ScanResult {
    CompiledDictionary::compile(rules).scan(text)
}

/// 仅匹配，不合并（区间为归一化文本上的偏移，不构建偏移映射）
pub fn match_rules(text: &str, rules: &[RuleEntry]) -> Vec<Match> {
    CompiledDictionary::compile(rules).match_normalized(&normalize(text))
}

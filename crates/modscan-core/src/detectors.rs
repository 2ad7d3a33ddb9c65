//! 编译后的规则字典
//!
//! 规则在加载时一次性编译为 `RuleKind::Literal | RuleKind::Pattern`：
//! - 无法编译的正则在此处被拒绝并记录 warn 日志，扫描时不再重复尝试；
//! - 未启用或归一化后为空的规则直接跳过；
//! - 保持字典原有顺序，命中记录按此顺序输出。
use aho_corasick::{AhoCorasick, MatchKind};
use regex_automata::meta;
use regex_automata::util::syntax;

use crate::engine::find_spans;
use crate::error::RuleCompileError;
use crate::findings::resolve;
use crate::normalize::{normalize, normalize_with_offsets};
use crate::rules::RuleEntry;
use crate::scan::ScanResult;
use crate::types::{Match, Severity};

/// 字面量查找器
/// - 纯 ASCII：Aho-Corasick（ASCII 大小写不敏感，LeftmostFirst，天然不重叠）
/// - 含非 ASCII：转义后的大小写不敏感正则（Unicode 大小写折叠）
#[derive(Debug, Clone)]
pub enum LiteralFinder {
    Ascii(AhoCorasick),
    Folded(meta::Regex),
}

/// 规则种类：字面量（needle 已归一化）或已编译正则
#[derive(Debug, Clone)]
pub enum RuleKind {
    Literal { finder: LiteralFinder },
    Pattern { regex: meta::Regex },
}

/// 单条编译后规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    /// 规则原文（用于命中记录）
    pub pattern: String,
    pub severity: Severity,
    pub kind: RuleKind,
}

impl CompiledRule {
    /// 编译单条规则；未启用或为空时返回 `Ok(None)`
    pub fn compile(entry: &RuleEntry) -> Result<Option<Self>, RuleCompileError> {
        if !entry.enabled {
            return Ok(None);
        }
        let needle = normalize(&entry.pattern);
        if needle.is_empty() {
            return Ok(None);
        }
        let rule_id = entry.display_id().to_string();

        let kind = if entry.is_pattern {
            let regex = build_case_insensitive(&entry.pattern).map_err(|e| {
                RuleCompileError::InvalidPattern {
                    rule_id: rule_id.clone(),
                    pattern: entry.pattern.clone(),
                    source: Box::new(e),
                }
            })?;
            RuleKind::Pattern { regex }
        } else if needle.is_ascii() {
            let ac = AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .match_kind(MatchKind::LeftmostFirst)
                .build([needle.as_str()])
                .map_err(|e| RuleCompileError::InvalidLiteral {
                    rule_id: rule_id.clone(),
                    pattern: entry.pattern.clone(),
                    source: e,
                })?;
            RuleKind::Literal { finder: LiteralFinder::Ascii(ac) }
        } else {
            let regex = build_case_insensitive(&regex::escape(&needle)).map_err(|e| {
                RuleCompileError::InvalidPattern {
                    rule_id: rule_id.clone(),
                    pattern: entry.pattern.clone(),
                    source: Box::new(e),
                }
            })?;
            RuleKind::Literal { finder: LiteralFinder::Folded(regex) }
        };

        Ok(Some(Self {
            id: rule_id,
            pattern: entry.pattern.clone(),
            severity: entry.severity,
            kind,
        }))
    }
}

fn build_case_insensitive(pattern: &str) -> Result<meta::Regex, meta::BuildError> {
    meta::Regex::builder()
        .syntax(syntax::Config::new().case_insensitive(true))
        .build(pattern)
}

/// 编译后的规则字典快照（不可变，可跨线程共享）
#[derive(Debug, Default)]
pub struct CompiledDictionary {
    rules: Vec<CompiledRule>,
    rejected: Vec<RuleCompileError>,
}

impl CompiledDictionary {
    /// 从规则条目编译；单条失败只拒绝该条
    pub fn compile(entries: &[RuleEntry]) -> Self {
        let mut rules = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();
        for entry in entries {
            match CompiledRule::compile(entry) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(rule_id = err.rule_id(), error = %err, "rejecting moderation rule");
                    rejected.push(err);
                }
            }
        }
        tracing::debug!(active = rules.len(), rejected = rejected.len(), "compiled rule dictionary");
        Self { rules, rejected }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rejected(&self) -> &[RuleCompileError] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 在已归一化文本上匹配全部规则
    pub fn match_normalized(&self, normalized: &str) -> Vec<Match> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let spans = find_spans(rule, normalized);
                if spans.is_empty() {
                    return None;
                }
                Some(Match {
                    rule_id: rule.id.clone(),
                    pattern: rule.pattern.clone(),
                    severity: rule.severity,
                    spans,
                })
            })
            .collect()
    }

    /// 扫描：归一化 → 匹配 → 合并
    pub fn scan(&self, text: &str) -> ScanResult {
        let normalized = normalize_with_offsets(text);
        let matches = self.match_normalized(&normalized.text);
        let runs = resolve(&matches);
        let highest_severity = runs.iter().map(|r| r.severity).max();
        ScanResult { matches, runs, highest_severity, normalized }
    }

    /// 缺失文本按空串处理
    pub fn scan_opt(&self, text: Option<&str>) -> ScanResult {
        self.scan(text.unwrap_or_default())
    }
}

//! 错误类型（模块）
use std::path::PathBuf;

use crate::types::Severity;

/// 规则字典加载/获取失败
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to read rule file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rule file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid decision policy: review_at ({review_at}) is stricter than block_at ({block_at})")]
    InvalidPolicy {
        review_at: Severity,
        block_at: Severity,
    },

    /// 远端存储不可用等外部故障
    #[error("rule dictionary backend unavailable: {0}")]
    Unavailable(String),
}

/// 单条规则编译失败（仅影响该规则，其余规则照常扫描）
#[derive(Debug, thiserror::Error)]
pub enum RuleCompileError {
    #[error("rule '{rule_id}' has invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        rule_id: String,
        pattern: String,
        source: Box<regex_automata::meta::BuildError>,
    },

    #[error("rule '{rule_id}' has unusable literal '{pattern}': {source}")]
    InvalidLiteral {
        rule_id: String,
        pattern: String,
        source: aho_corasick::BuildError,
    },
}

impl RuleCompileError {
    pub fn rule_id(&self) -> &str {
        match self {
            RuleCompileError::InvalidPattern { rule_id, .. } => rule_id,
            RuleCompileError::InvalidLiteral { rule_id, .. } => rule_id,
        }
    }
}

/// 决策名称无法识别
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown decision '{0}' (expected pass, review or block)")]
pub struct ParseDecisionError(pub String);

/// 边界处理（precheck / preview）错误
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("rule dictionary unavailable: {0}")]
    DictionaryUnavailable(#[from] DictionaryError),

    #[error("too many requests from client '{client}'")]
    Throttled { client: String },
}

//! 规则文件加载（TOML）
//!
//! 文件结构：
//! ```toml
//! [policy]
//! review_at = "low"
//! block_at = "high"
//! on_unavailable = "pass"
//!
//! [[rules]]
//! id = "contact-leak"
//! pattern = "whatsapp"
//! severity = "medium"
//!
//! [[rules]]
//! id = "phone"
//! pattern = '\+?\d[\d -]{7,}\d'
//! is_pattern = true
//! severity = "high"
//! ```
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decision::DecisionPolicy;
use crate::error::DictionaryError;
use crate::types::{Decision, Severity};

/// 单条规则（与外部持久化形状一致：id / pattern / is_pattern / severity / enabled / notes）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    #[serde(default)]
    pub id: String,
    pub pattern: String,
    /// true：按正则解释；false：按字面量解释
    #[serde(default)]
    pub is_pattern: bool,
    pub severity: Severity,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl RuleEntry {
    /// 构造字面量规则（默认启用）
    pub fn literal(pattern: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: String::new(),
            pattern: pattern.into(),
            is_pattern: false,
            severity,
            enabled: true,
            notes: None,
        }
    }

    /// 构造正则规则（默认启用）
    pub fn regex(pattern: impl Into<String>, severity: Severity) -> Self {
        Self { is_pattern: true, ..Self::literal(pattern, severity) }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// 用于日志与命中记录的标识：无 id 时退回 pattern 原文
    pub fn display_id(&self) -> &str {
        if self.id.is_empty() { &self.pattern } else { &self.id }
    }
}

/// 决策策略配置（原始形态，校验后转为 DecisionPolicy）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_review_at")]
    pub review_at: Severity,
    #[serde(default = "default_block_at")]
    pub block_at: Severity,
    /// 字典不可用时边界层采用的决策（默认 pass，即 fail-open）
    #[serde(default = "default_on_unavailable")]
    pub on_unavailable: Decision,
}

fn default_review_at() -> Severity {
    Severity::Low
}

fn default_block_at() -> Severity {
    Severity::High
}

fn default_on_unavailable() -> Decision {
    Decision::Pass
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            review_at: default_review_at(),
            block_at: default_block_at(),
            on_unavailable: default_on_unavailable(),
        }
    }
}

/// 顶层规则文件结构
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

impl RuleFile {
    pub fn from_toml_str(txt: &str) -> Result<Self, DictionaryError> {
        Ok(toml::from_str(txt)?)
    }

    /// 从 TOML 规则文件加载
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let txt = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&txt)
    }

    /// 校验并生成决策策略（review_at 不得严于 block_at）
    pub fn decision_policy(&self) -> Result<DecisionPolicy, DictionaryError> {
        DecisionPolicy::new(self.policy.review_at, self.policy.block_at)
    }
}

//! 边界处理：提交前同步预检（precheck）与审核预览（preview）
//!
//! 规则字典由外部存储提供，通过 `DictionarySource` 获取不可变快照。
//! 字典不可用时：
//! - precheck 采用配置的 `on_unavailable` 决策（默认 pass，即 fail-open），并记录 warn 日志；
//! - preview 直接返回错误，不会渲染未经扫描的“干净”预览。
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::decision::DecisionPolicy;
use crate::detectors::CompiledDictionary;
use crate::error::{DictionaryError, GateError};
use crate::highlight::highlight;
use crate::rules::{RuleEntry, RuleFile};
use crate::throttle::SlidingWindowLimiter;
use crate::types::Decision;

/// 规则字典来源（外部协作方）
pub trait DictionarySource: Send + Sync {
    fn snapshot(&self) -> Result<Arc<CompiledDictionary>, DictionaryError>;
}

/// 内存中的固定字典
#[derive(Debug, Clone)]
pub struct StaticSource {
    dict: Arc<CompiledDictionary>,
}

impl StaticSource {
    pub fn new(dict: CompiledDictionary) -> Self {
        Self { dict: Arc::new(dict) }
    }

    pub fn from_entries(entries: &[RuleEntry]) -> Self {
        Self::new(CompiledDictionary::compile(entries))
    }
}

impl DictionarySource for StaticSource {
    fn snapshot(&self) -> Result<Arc<CompiledDictionary>, DictionaryError> {
        Ok(Arc::clone(&self.dict))
    }
}

/// 每次快照都重新读取 TOML 规则文件
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DictionarySource for FileSource {
    fn snapshot(&self) -> Result<Arc<CompiledDictionary>, DictionaryError> {
        let file = RuleFile::load(&self.path)?;
        Ok(Arc::new(CompiledDictionary::compile(&file.rules)))
    }
}

/// 提交类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Need,
    Offer,
    Message,
    Profile,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckRequest {
    pub kind: SubmissionKind,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecheckResponse {
    pub level: Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
}

/// 审核网关：组合字典来源、决策策略、降级决策与可选限流器
pub struct Moderator<S> {
    source: S,
    policy: DecisionPolicy,
    on_unavailable: Decision,
    limiter: Option<SlidingWindowLimiter>,
}

impl<S: DictionarySource> Moderator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            policy: DecisionPolicy::default(),
            on_unavailable: Decision::Pass,
            limiter: None,
        }
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn on_unavailable(mut self, decision: Decision) -> Self {
        self.on_unavailable = decision;
        self
    }

    pub fn with_limiter(mut self, limiter: SlidingWindowLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn limiter(&self) -> Option<&SlidingWindowLimiter> {
        self.limiter.as_ref()
    }

    pub fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    /// 提交前同步预检
    pub fn precheck(
        &self,
        client: &str,
        req: &PrecheckRequest,
        now: Instant,
    ) -> Result<PrecheckResponse, GateError> {
        if let Some(limiter) = &self.limiter {
            if !limiter.check(client, now) {
                tracing::debug!(client, "precheck throttled");
                return Err(GateError::Throttled { client: client.to_string() });
            }
        }

        let dict = match self.source.snapshot() {
            Ok(dict) => dict,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    kind = ?req.kind,
                    fallback = %self.on_unavailable,
                    "rule dictionary unavailable; precheck falls back without scanning"
                );
                return Ok(PrecheckResponse { level: self.on_unavailable });
            }
        };

        let result = dict.scan_opt(req.text.as_deref());
        let level = self.policy.decide(&result);
        tracing::debug!(
            kind = ?req.kind,
            level = %level,
            runs = result.runs.len(),
            "precheck decided"
        );
        Ok(PrecheckResponse { level })
    }

    /// 审核预览：高亮段映射回原文后渲染
    pub fn preview(&self, req: &PreviewRequest) -> Result<PreviewResponse, GateError> {
        let dict = self.source.snapshot()?;
        let text = req.text.as_deref().unwrap_or_default();
        let result = dict.scan(text);
        Ok(PreviewResponse { html: highlight(text, &result.original_runs()) })
    }
}

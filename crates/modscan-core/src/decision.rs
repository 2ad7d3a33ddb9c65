//! 决策引擎：最高严重级别 → pass / review / block
use crate::error::DictionaryError;
use crate::scan::ScanResult;
use crate::types::{Decision, Severity};

/// 决策阈值
/// - 严重级别 >= `block_at` → block
/// - 严重级别 >= `review_at` → review
/// - 其余（含无命中）→ pass
///
/// 构造时要求 `review_at <= block_at`，保证更严重的输入不会得到更宽松的决策。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPolicy {
    review_at: Severity,
    block_at: Severity,
}

impl DecisionPolicy {
    pub fn new(review_at: Severity, block_at: Severity) -> Result<Self, DictionaryError> {
        if review_at > block_at {
            return Err(DictionaryError::InvalidPolicy { review_at, block_at });
        }
        Ok(Self { review_at, block_at })
    }

    pub fn review_at(&self) -> Severity {
        self.review_at
    }

    pub fn block_at(&self) -> Severity {
        self.block_at
    }

    pub fn decide_severity(&self, highest: Option<Severity>) -> Decision {
        match highest {
            None => Decision::Pass,
            Some(s) if s >= self.block_at => Decision::Block,
            Some(s) if s >= self.review_at => Decision::Review,
            Some(_) => Decision::Pass,
        }
    }

    pub fn decide(&self, result: &ScanResult) -> Decision {
        self.decide_severity(result.highest_severity)
    }
}

impl Default for DecisionPolicy {
    /// low/medium → review，high → block
    fn default() -> Self {
        Self { review_at: Severity::Low, block_at: Severity::High }
    }
}

/// 按默认策略决策
pub fn decide(result: &ScanResult) -> Decision {
    DecisionPolicy::default().decide(result)
}

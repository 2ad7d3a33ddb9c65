//! 滑动窗口限流（显式注入，不使用进程级全局表）
//!
//! 每个客户端键维护窗口内的请求时间队列；时间由调用方传入，便于测试。
//! 空闲超过一个窗口的键在 `check` 中每过一个窗口清扫一次，也可通过 `evict_expired` 主动回收。
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::options::ThrottleConfig;

#[derive(Debug, Default)]
struct State {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

impl State {
    fn sweep(&mut self, now: Instant, window: Duration) -> usize {
        let before = self.hits.len();
        self.hits.retain(|_, queue| match queue.back() {
            Some(&newest) => now.saturating_duration_since(newest) < window,
            None => false,
        });
        self.last_sweep = Some(now);
        before - self.hits.len()
    }
}

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: ThrottleConfig,
    state: Mutex<State>,
}

impl SlidingWindowLimiter {
    pub fn new(config: ThrottleConfig) -> Self {
        Self { config, state: Mutex::new(State::default()) }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    /// 判断 `key` 在 `now` 时刻是否放行；放行时记录一次命中
    /// 距上次清扫满一个窗口时，先回收全部空闲键，键的数量以最近两个窗口内的活跃客户端为上界。
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let window = self.config.window;
        let mut state = self.lock();
        let due = match state.last_sweep {
            Some(last) => now.saturating_duration_since(last) >= window,
            None => true,
        };
        if due {
            let evicted = state.sweep(now, window);
            if evicted > 0 {
                tracing::trace!(evicted, "throttle evicted idle clients");
            }
        }
        let queue = state.hits.entry(key.to_string()).or_default();
        while let Some(&oldest) = queue.front() {
            if now.saturating_duration_since(oldest) >= window {
                queue.pop_front();
            } else {
                break;
            }
        }
        if queue.len() >= self.config.max_hits {
            return false;
        }
        queue.push_back(now);
        true
    }

    /// 回收最近一次命中已超出窗口的键，返回回收数量
    pub fn evict_expired(&self, now: Instant) -> usize {
        self.lock().sweep(now, self.config.window)
    }

    pub fn tracked_keys(&self) -> usize {
        self.lock().hits.len()
    }
}

//! Rate Limit - 固定窗口限流规则
//!
//! 纯逻辑：层级、策略、单个 key 的窗口计数。存储与并发由 memory 层负责

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// 超限时返回给调用方的固定错误信息
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// 限流层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitTier {
    /// 通用 API（v1 / v2 / v2-beta 共享）
    Api,
    /// AI 接口，更严格
    Ai,
}

impl RateLimitTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitTier::Api => "api",
            RateLimitTier::Ai => "ai",
        }
    }
}

/// 限流策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// 每个窗口允许的最大请求数
    pub limit: u32,
    /// 窗口长度
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    /// 通用 API 默认策略：100 次 / 60 秒
    pub fn api_default() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    /// AI 默认策略：3 次 / 60 秒
    pub fn ai_default() -> Self {
        Self::new(3, Duration::from_secs(60))
    }
}

/// 单次准入判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub admitted: bool,
    pub limit: u32,
    /// 本窗口剩余可用次数
    pub remaining: u32,
    /// 距离窗口重置的时间
    pub reset_after: Duration,
    pub window: Duration,
}

impl RateLimitDecision {
    /// 重置时间（秒，向上取整）
    pub fn reset_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

/// 单个 key 的固定窗口
///
/// 窗口从该 key 的首次请求开始计时，过期后的首次请求开启新窗口
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    started_at: Instant,
    count: u32,
}

impl FixedWindow {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            count: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_expired(&self, policy: &RateLimitPolicy, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= policy.window
    }

    /// 记录一次请求并判定是否准入
    ///
    /// 被拒绝的请求不计数
    pub fn hit(&mut self, policy: &RateLimitPolicy, now: Instant) -> RateLimitDecision {
        if self.is_expired(policy, now) {
            *self = Self::new(now);
        }

        let admitted = self.count < policy.limit;
        if admitted {
            self.count += 1;
        }

        let elapsed = now.saturating_duration_since(self.started_at);
        RateLimitDecision {
            admitted,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(self.count),
            reset_after: policy.window.saturating_sub(elapsed),
            window: policy.window,
        }
    }
}

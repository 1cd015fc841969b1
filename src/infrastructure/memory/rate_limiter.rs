//! In-Memory Rate Limiter Implementation

use dashmap::DashMap;
use std::time::Instant;

use crate::application::ports::RateLimiterPort;
use crate::domain::{ClientKey, FixedWindow, RateLimitDecision, RateLimitPolicy, RateLimitTier};

/// 内存限流计数器
///
/// 同一 key 的判定在 DashMap 分片写锁内完成，保证检查与计数是原子的
pub struct InMemoryRateLimiter {
    /// (tier, client key) -> 当前窗口
    windows: DashMap<(RateLimitTier, ClientKey), FixedWindow>,
    api_policy: RateLimitPolicy,
    ai_policy: RateLimitPolicy,
}

impl InMemoryRateLimiter {
    pub fn new(api_policy: RateLimitPolicy, ai_policy: RateLimitPolicy) -> Self {
        Self {
            windows: DashMap::new(),
            api_policy,
            ai_policy,
        }
    }

    fn check_at(&self, tier: RateLimitTier, key: ClientKey, now: Instant) -> RateLimitDecision {
        let policy = self.policy(tier);
        let mut window = self
            .windows
            .entry((tier, key))
            .or_insert_with(|| FixedWindow::new(now));
        let decision = window.hit(&policy, now);
        drop(window);

        if !decision.admitted {
            tracing::warn!(
                tier = tier.as_str(),
                client = %key,
                limit = decision.limit,
                reset_after_secs = decision.reset_after_secs(),
                "Rate limit exceeded"
            );
        }
        decision
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut purged = 0;
        self.windows.retain(|(tier, _), window| {
            let keep = !window.is_expired(&self.policy(*tier), now);
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::api_default(), RateLimitPolicy::ai_default())
    }
}

impl RateLimiterPort for InMemoryRateLimiter {
    fn check(&self, tier: RateLimitTier, key: ClientKey) -> RateLimitDecision {
        self.check_at(tier, key, Instant::now())
    }

    fn policy(&self, tier: RateLimitTier) -> RateLimitPolicy {
        match tier {
            RateLimitTier::Api => self.api_policy,
            RateLimitTier::Ai => self.ai_policy,
        }
    }

    fn purge_expired(&self) -> usize {
        let purged = self.purge_expired_at(Instant::now());
        tracing::debug!(
            purged = purged,
            remaining = self.windows.len(),
            "Expired rate limit windows purged"
        );
        purged
    }

    fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

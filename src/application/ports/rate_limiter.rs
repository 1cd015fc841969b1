//! Rate Limiter Port - 共享计数服务
//!
//! 按 (tier, client key) 计数，提供原子的 "准入或拒绝" 判定

use crate::domain::{ClientKey, RateLimitDecision, RateLimitPolicy, RateLimitTier};

/// Rate Limiter Port
pub trait RateLimiterPort: Send + Sync {
    /// 记录一次请求并返回判定结果
    ///
    /// 同一 key 的并发调用之间必须是原子的，每个窗口准入数不超过策略上限
    fn check(&self, tier: RateLimitTier, key: ClientKey) -> RateLimitDecision;

    /// 层级对应的策略
    fn policy(&self, tier: RateLimitTier) -> RateLimitPolicy;

    /// 清理已过期的窗口，返回清理数量
    fn purge_expired(&self) -> usize;

    /// 当前跟踪的 key 数量
    fn tracked_keys(&self) -> usize;
}

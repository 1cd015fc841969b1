//! Memory Layer - In-Memory State Management
//!
//! 实现 RateLimiterPort，按 (tier, client key) 维护固定窗口计数

mod rate_limiter;

pub use rate_limiter::InMemoryRateLimiter;

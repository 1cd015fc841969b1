//! Worker Layer - 后台任务

mod rate_limit_sweeper;

pub use rate_limit_sweeper::{RateLimitSweeper, RateLimitSweeperConfig};

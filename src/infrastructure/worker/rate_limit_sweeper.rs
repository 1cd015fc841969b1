//! Rate Limit Sweeper - Background Expired Window Cleanup

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::RateLimiterPort;

/// Sweeper 配置
#[derive(Debug, Clone)]
pub struct RateLimitSweeperConfig {
    /// 清理间隔
    pub interval: Duration,
}

impl Default for RateLimitSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// 限流窗口清理 Worker
///
/// 定期清理过期窗口，避免不再访问的客户端长期占用内存
pub struct RateLimitSweeper {
    config: RateLimitSweeperConfig,
    limiter: Arc<dyn RateLimiterPort>,
}

impl RateLimitSweeper {
    pub fn new(config: RateLimitSweeperConfig, limiter: Arc<dyn RateLimiterPort>) -> Self {
        Self { config, limiter }
    }

    /// 启动 Worker，直到所在任务被取消
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "RateLimitSweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 第一次 tick 立即返回
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep_once();
        }
    }

    /// 执行一次清理
    pub fn sweep_once(&self) -> usize {
        let purged = self.limiter.purge_expired();
        if purged > 0 {
            tracing::debug!(
                purged = purged,
                tracked = self.limiter.tracked_keys(),
                "Rate limit sweep completed"
            );
        }
        purged
    }
}

//! Rate Limit Middleware
//!
//! 按挂载点的层级做准入控制，超限直接返回 429，不重试不排队

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use crate::application::{RateLimiterPort, RequestContext};
use crate::domain::{ClientKey, RateLimitDecision, RateLimitTier};

const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// 限流闸门：一个层级 + 共享计数服务
#[derive(Clone)]
pub struct RateLimitGate {
    limiter: Arc<dyn RateLimiterPort>,
    tier: RateLimitTier,
}

impl RateLimitGate {
    pub fn new(limiter: Arc<dyn RateLimiterPort>, tier: RateLimitTier) -> Self {
        Self { limiter, tier }
    }
}

/// 限流中间件
///
/// 限流 key 为调用方 IP，无法识别时退化为共享的 `unknown` key
pub async fn enforce_rate_limit(
    State(gate): State<RateLimitGate>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<RequestContext>()
        .and_then(RequestContext::peer);
    let key = ClientKey::from_request_metadata(request.headers(), peer);

    let decision = gate.limiter.check(gate.tier, key);

    let mut response = if decision.admitted {
        next.run(request).await
    } else {
        let mut response = ApiError::TooManyRequests.into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(decision.reset_after_secs()));
        response
    };

    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

/// 标准限流响应头（draft-6）
fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    let policy = format!("{};w={}", decision.limit, decision.window.as_secs());
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(RATELIMIT_POLICY, value);
    }
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(decision.reset_after_secs()));
}

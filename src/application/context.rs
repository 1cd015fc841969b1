//! Request Context
//!
//! 显式传递给所有下游处理器的请求上下文（请求 ID + 绑定该 ID 的日志 span）

use std::net::SocketAddr;

use http::Method;
use tracing::Span;

use crate::domain::RequestId;

/// 请求上下文
///
/// 由请求上下文中间件创建并放入 request extensions，生命周期与请求一致
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    peer: Option<SocketAddr>,
    span: Span,
}

impl RequestContext {
    /// 创建上下文，并派生携带 request_id 的 span
    pub fn new(request_id: RequestId, method: &Method, path: &str, peer: Option<SocketAddr>) -> Self {
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %path,
            route = tracing::field::Empty,
        );
        Self {
            request_id,
            peer,
            span,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// TCP 对端地址（仅在以 ConnectInfo 启动时可用）
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// 绑定了 request_id 的日志 span
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// 记录命中的挂载点
    pub fn record_route(&self, route: &str) {
        self.span.record("route", route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_request_id() {
        let id = RequestId::from_inbound("req-1").unwrap();
        let ctx = RequestContext::new(id.clone(), &Method::GET, "/api/v1/documents", None);
        assert_eq!(ctx.request_id(), &id);
        assert!(ctx.peer().is_none());
        ctx.record_route("v1");
    }
}

//! HTTP Middleware
//!
//! - 请求上下文：分配请求 ID，派生日志 span，回写 X-Request-Id
//! - HTTP 状态码错误日志

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use super::state::AppState;
use crate::application::RequestContext;
use crate::domain::{RequestId, REQUEST_ID_HEADER};

/// 请求上下文中间件
///
/// 位于中间件栈最外层：之后的所有日志都在携带 request_id 的 span 内，
/// 下游处理器通过 `Extension<RequestContext>` 拿到同一个上下文
pub async fn request_context_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = RequestId::from_inbound_or_generate(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let ctx = RequestContext::new(
        request_id.clone(),
        request.method(),
        request.uri().path(),
        peer,
    );
    if let Some(entry) = state
        .api_relative_path(request.uri().path())
        .and_then(|path| state.route_table.resolve(path))
    {
        ctx.record_route(entry.name());
    }

    let span = ctx.span().clone();
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// HTTP 状态码错误日志中间件
///
/// 拦截 HTTP 响应，当状态码为 4xx 或 5xx 时记录日志
/// 注意：协作服务透传的错误响应同样会被记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP client error"
        );
    }

    response
}

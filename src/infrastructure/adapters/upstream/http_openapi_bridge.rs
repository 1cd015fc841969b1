//! HTTP OpenAPI Bridge - 转发到 tRPC-to-REST 服务
//!
//! 实现 OpenApiBridgePort，beta 开关通过 `X-Api-Beta` 请求头传递

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use http::{HeaderName, HeaderValue};

use super::http_upstream::HttpUpstream;
use crate::application::ports::{CollaboratorError, OpenApiBridgePort};
use crate::application::RequestContext;
use crate::domain::ApiSurface;

/// beta 开关请求头
pub const API_BETA_HEADER: &str = "x-api-beta";

/// HTTP OpenAPI Bridge
pub struct HttpOpenApiBridge {
    upstream: HttpUpstream,
}

impl HttpOpenApiBridge {
    pub fn new(upstream: HttpUpstream) -> Self {
        Self { upstream }
    }
}

/// beta 开关对应的请求头
fn beta_header(surface: ApiSurface) -> (HeaderName, HeaderValue) {
    let value = if surface.is_beta() { "true" } else { "false" };
    (
        HeaderName::from_static(API_BETA_HEADER),
        HeaderValue::from_static(value),
    )
}

#[async_trait]
impl OpenApiBridgePort for HttpOpenApiBridge {
    async fn handle(
        &self,
        ctx: &RequestContext,
        surface: ApiSurface,
        request: Request,
    ) -> Result<Response, CollaboratorError> {
        tracing::debug!(
            parent: ctx.span(),
            upstream = %self.upstream.name(),
            is_beta = surface.is_beta(),
            "Dispatching to OpenAPI bridge"
        );
        self.upstream
            .forward(ctx, request, &[beta_header(surface)])
            .await
    }
}

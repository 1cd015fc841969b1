//! Delegate Handlers
//!
//! 把请求交给协作服务或 OpenAPI bridge，响应原样返回

use axum::{
    extract::{OriginalUri, Request},
    response::Response,
};
use std::sync::Arc;

use crate::application::RequestContext;
use crate::domain::{ApiSurface, CollaboratorKind};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 交给协作服务
pub async fn delegate(
    state: Arc<AppState>,
    ctx: RequestContext,
    kind: CollaboratorKind,
    request: Request,
) -> Result<Response, ApiError> {
    let request = restore_original_uri(request);

    state
        .collaborators
        .get(kind)
        .handle(&ctx, request)
        .await
        .map_err(|e| {
            tracing::warn!(collaborator = kind.as_str(), error = %e, "Collaborator call failed");
            ApiError::from(e)
        })
}

/// 交给 tRPC-to-REST bridge
pub async fn bridge(
    state: Arc<AppState>,
    ctx: RequestContext,
    surface: ApiSurface,
    request: Request,
) -> Result<Response, ApiError> {
    let request = restore_original_uri(request);

    state
        .openapi_bridge
        .handle(&ctx, surface, request)
        .await
        .map_err(|e| {
            tracing::warn!(surface = surface.as_str(), error = %e, "OpenAPI bridge call failed");
            ApiError::from(e)
        })
}

/// 兜底：`/api` 下未命中任何挂载点
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// 嵌套路由会去掉前缀，协作服务需要看到完整的原始 URI
fn restore_original_uri(mut request: Request) -> Request {
    if let Some(OriginalUri(uri)) = request.extensions().get::<OriginalUri>().cloned() {
        *request.uri_mut() = uri;
    }
    request
}

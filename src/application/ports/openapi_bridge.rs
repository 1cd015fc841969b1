//! OpenAPI Bridge Port - tRPC-to-REST 转换服务抽象

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

use super::collaborator::CollaboratorError;
use crate::application::context::RequestContext;
use crate::domain::ApiSurface;

/// OpenAPI Bridge Port
///
/// 版本分组中未被下载路由命中的请求都交给 bridge。
/// beta 开关的具体效果由 bridge 决定
#[async_trait]
pub trait OpenApiBridgePort: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext,
        surface: ApiSurface,
        request: Request,
    ) -> Result<Response, CollaboratorError>;
}

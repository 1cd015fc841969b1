//! Collaborator Port - 外部协作服务抽象
//!
//! auth / files / ai / v1 / jobs / trpc / download 都是黑盒，
//! 路由层只负责把请求交给它们，响应原样返回

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use thiserror::Error;

use crate::application::context::RequestContext;

/// 协作服务调用错误
///
/// 仅表示无法拿到协作服务的响应；协作服务自己返回的 4xx/5xx 是正常响应
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream timeout")]
    Timeout,

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Collaborator Port
#[async_trait]
pub trait CollaboratorPort: Send + Sync {
    /// 处理请求
    ///
    /// `request` 的 URI 是完整的原始 URI（包含 `/api` 前缀）
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: Request,
    ) -> Result<Response, CollaboratorError>;
}

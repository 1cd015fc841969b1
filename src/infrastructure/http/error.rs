//! HTTP Error Handling
//!
//! 路由层自身产生的错误。协作服务返回的 4xx/5xx 直接透传，不经过这里

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::CollaboratorError;
use crate::domain::RATE_LIMIT_MESSAGE;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    PayloadTooLarge(String),
    /// 超出限流，消息固定
    TooManyRequests,
    BadGateway(String),
    GatewayTimeout(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) => {
                tracing::debug!(error = %msg, "Route not found");
                msg
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                msg
            }
            ApiError::PayloadTooLarge(msg) => {
                tracing::warn!(error = %msg, "Payload too large");
                msg
            }
            ApiError::TooManyRequests => RATE_LIMIT_MESSAGE.to_string(),
            ApiError::BadGateway(msg) => {
                tracing::error!(error = %msg, "Upstream unavailable");
                msg
            }
            ApiError::GatewayTimeout(msg) => {
                tracing::error!(error = %msg, "Upstream timeout");
                msg
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

impl From<CollaboratorError> for ApiError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::Unavailable(_) => ApiError::BadGateway("Upstream unavailable".to_string()),
            CollaboratorError::InvalidResponse(_) => {
                ApiError::BadGateway("Invalid upstream response".to_string())
            }
            CollaboratorError::Timeout => ApiError::GatewayTimeout("Upstream timeout".to_string()),
            CollaboratorError::BodyTooLarge { limit } => {
                ApiError::PayloadTooLarge(format!("Request body exceeds {} bytes", limit))
            }
            CollaboratorError::InvalidRequest(msg) => ApiError::BadRequest(msg),
        }
    }
}

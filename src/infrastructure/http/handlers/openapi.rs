//! OpenAPI Document Handler

use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// 返回启动时加载的 OpenAPI 文档
pub async fn openapi_document(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.openapi_document.as_ref().clone())
}

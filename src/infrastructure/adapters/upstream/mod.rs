//! Upstream Adapter - 协作服务的 HTTP 转发实现

mod http_openapi_bridge;
mod http_upstream;

pub use http_openapi_bridge::{HttpOpenApiBridge, API_BETA_HEADER};
pub use http_upstream::*;

//! HTTP Layer - API 边缘路由
//!
//! 请求 ID、限流、按路径分发给协作服务

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{build_router, HttpServer, ServerConfig};
pub use state::{AppState, Collaborators};

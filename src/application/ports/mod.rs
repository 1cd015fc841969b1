//! Application Ports - 出站端口定义
//!
//! 定义路由层与协作服务、限流存储之间的抽象接口

mod collaborator;
mod openapi_bridge;
mod rate_limiter;

pub use collaborator::{CollaboratorError, CollaboratorPort};
pub use openapi_bridge::OpenApiBridgePort;
pub use rate_limiter::RateLimiterPort;

//! 应用层
//!
//! 包含：
//! - ports: 六边形架构端口定义（协作服务、OpenAPI bridge、限流计数）
//! - context: 贯穿请求生命周期的上下文

pub mod context;
pub mod ports;

pub use context::RequestContext;
pub use ports::{CollaboratorError, CollaboratorPort, OpenApiBridgePort, RateLimiterPort};

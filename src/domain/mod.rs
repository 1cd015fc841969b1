//! Domain Layer - 领域层
//!
//! 路由层自身拥有的规则：
//! - 请求 ID 与限流 key
//! - 固定窗口限流
//! - 版本分组路径推导与挂载表

pub mod api_surface;
pub mod client_key;
pub mod rate_limit;
pub mod request_id;
pub mod routing;

pub use api_surface::{ApiSurface, SurfacePathError, VersionedSurfaces};
pub use client_key::{extract_client_ip, ClientIpError, ClientKey, UNKNOWN_CLIENT_KEY};
pub use rate_limit::{
    FixedWindow, RateLimitDecision, RateLimitPolicy, RateLimitTier, RATE_LIMIT_MESSAGE,
};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use routing::{
    CollaboratorKind, RouteEntry, RouteTable, RouteTableError, RouteTarget,
    DEFAULT_DOWNLOAD_ROUTES, OPENAPI_DOCUMENT_PATH,
};

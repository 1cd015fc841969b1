//! Route Table - 挂载点定义
//!
//! `/api` 下的固定、手工排序的挂载表。HTTP 层按此表构建 axum Router，
//! 请求上下文中间件用它给日志标注命中的挂载点

use thiserror::Error;

use super::api_surface::{ApiSurface, VersionedSurfaces};
use super::rate_limit::RateLimitTier;

/// 版本分组内的 OpenAPI 文档路径
pub const OPENAPI_DOCUMENT_PATH: &str = "/openapi.json";

/// 默认的下载路由（相对于版本分组）
pub const DEFAULT_DOWNLOAD_ROUTES: &[&str] = &[
    "/envelope/item/:envelope_item_id/download",
    "/envelope/item/:envelope_item_id/download/:version",
];

/// 路由表错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("Mount {0} overlaps with mount {1}")]
    Overlap(String, String),

    #[error("Invalid download route: {0}")]
    InvalidDownloadRoute(String),

    #[error("Duplicate download route: {0}")]
    DuplicateDownloadRoute(String),
}

/// 外部协作服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaboratorKind {
    Auth,
    Files,
    Ai,
    /// v1 tagged REST API
    RestV1,
    Jobs,
    Trpc,
    /// v2 分组内的二进制下载
    Download,
}

impl CollaboratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorKind::Auth => "auth",
            CollaboratorKind::Files => "files",
            CollaboratorKind::Ai => "ai",
            CollaboratorKind::RestV1 => "v1",
            CollaboratorKind::Jobs => "jobs",
            CollaboratorKind::Trpc => "trpc",
            CollaboratorKind::Download => "download",
        }
    }
}

/// 挂载目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// 整个前缀交给一个协作服务
    Collaborator(CollaboratorKind),
    /// 版本分组：openapi.json > CORS > 下载 > bridge
    Versioned(ApiSurface),
}

/// 挂载点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// 相对于 API base path 的前缀，如 `/auth`
    pub prefix: String,
    pub target: RouteTarget,
    pub rate_limit: Option<RateLimitTier>,
    pub cors: bool,
}

impl RouteEntry {
    fn new(prefix: impl Into<String>, target: RouteTarget) -> Self {
        Self {
            prefix: prefix.into(),
            target,
            rate_limit: None,
            cors: false,
        }
    }

    fn rate_limited(mut self, tier: RateLimitTier) -> Self {
        self.rate_limit = Some(tier);
        self
    }

    fn with_cors(mut self) -> Self {
        self.cors = true;
        self
    }

    /// 用于日志的挂载名
    pub fn name(&self) -> &'static str {
        match self.target {
            RouteTarget::Collaborator(kind) => kind.as_str(),
            RouteTarget::Versioned(surface) => surface.as_str(),
        }
    }

    /// 按路径段边界匹配前缀
    pub fn matches(&self, path: &str) -> bool {
        segment_prefix(&self.prefix, path)
    }
}

/// 挂载表
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    download_routes: Vec<String>,
}

impl RouteTable {
    /// 构建挂载表，顺序固定
    pub fn new(
        surfaces: &VersionedSurfaces,
        download_routes: Vec<String>,
    ) -> Result<Self, RouteTableError> {
        use CollaboratorKind::*;

        let entries = vec![
            RouteEntry::new("/auth", RouteTarget::Collaborator(Auth)),
            RouteEntry::new("/files", RouteTarget::Collaborator(Files)),
            RouteEntry::new("/ai", RouteTarget::Collaborator(Ai)).rate_limited(RateLimitTier::Ai),
            RouteEntry::new("/v1", RouteTarget::Collaborator(RestV1))
                .rate_limited(RateLimitTier::Api)
                .with_cors(),
            RouteEntry::new("/jobs", RouteTarget::Collaborator(Jobs)),
            RouteEntry::new("/trpc", RouteTarget::Collaborator(Trpc)),
            RouteEntry::new(
                surfaces.path(ApiSurface::Stable),
                RouteTarget::Versioned(ApiSurface::Stable),
            )
            .rate_limited(RateLimitTier::Api)
            .with_cors(),
            RouteEntry::new(
                surfaces.path(ApiSurface::Beta),
                RouteTarget::Versioned(ApiSurface::Beta),
            )
            .rate_limited(RateLimitTier::Api)
            .with_cors(),
        ];

        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                if segment_prefix(&a.prefix, &b.prefix) || segment_prefix(&b.prefix, &a.prefix) {
                    return Err(RouteTableError::Overlap(a.prefix.clone(), b.prefix.clone()));
                }
            }
        }

        validate_download_routes(&download_routes)?;

        Ok(Self {
            entries,
            download_routes,
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn download_routes(&self) -> &[String] {
        &self.download_routes
    }

    /// 最长前缀匹配，`path` 相对于 API base path
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(path))
            .max_by_key(|entry| entry.prefix.len())
    }
}

fn validate_download_routes(routes: &[String]) -> Result<(), RouteTableError> {
    let mut seen = std::collections::HashSet::new();
    for route in routes {
        if !route.starts_with('/') || route == "/" || route == OPENAPI_DOCUMENT_PATH {
            return Err(RouteTableError::InvalidDownloadRoute(route.clone()));
        }
        if !seen.insert(route.as_str()) {
            return Err(RouteTableError::DuplicateDownloadRoute(route.clone()));
        }
    }
    Ok(())
}

/// `prefix` 是否在路径段边界上是 `path` 的前缀
fn segment_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

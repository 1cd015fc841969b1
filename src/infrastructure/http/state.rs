//! Application State
//!
//! 路由层运行时共享的状态：挂载表、限流计数、协作服务端口、OpenAPI 文档

use std::sync::Arc;

use serde_json::Value;

use crate::application::{CollaboratorPort, OpenApiBridgePort, RateLimiterPort};
use crate::domain::api_surface::normalize_path;
use crate::domain::{CollaboratorKind, RouteTable};

/// 所有挂载的协作服务
#[derive(Clone)]
pub struct Collaborators {
    pub auth: Arc<dyn CollaboratorPort>,
    pub files: Arc<dyn CollaboratorPort>,
    pub ai: Arc<dyn CollaboratorPort>,
    pub rest_v1: Arc<dyn CollaboratorPort>,
    pub jobs: Arc<dyn CollaboratorPort>,
    pub trpc: Arc<dyn CollaboratorPort>,
    pub download: Arc<dyn CollaboratorPort>,
}

impl Collaborators {
    pub fn get(&self, kind: CollaboratorKind) -> &Arc<dyn CollaboratorPort> {
        match kind {
            CollaboratorKind::Auth => &self.auth,
            CollaboratorKind::Files => &self.files,
            CollaboratorKind::Ai => &self.ai,
            CollaboratorKind::RestV1 => &self.rest_v1,
            CollaboratorKind::Jobs => &self.jobs,
            CollaboratorKind::Trpc => &self.trpc,
            CollaboratorKind::Download => &self.download,
        }
    }
}

/// 应用状态
pub struct AppState {
    /// API base path，如 `/api`（不带末尾 `/`）
    pub api_base: String,
    pub route_table: Arc<RouteTable>,

    // ========== Ports ==========
    pub rate_limiter: Arc<dyn RateLimiterPort>,
    pub collaborators: Collaborators,
    pub openapi_bridge: Arc<dyn OpenApiBridgePort>,

    /// 启动时加载的 OpenAPI 文档
    pub openapi_document: Arc<Value>,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        api_base: &str,
        route_table: RouteTable,
        rate_limiter: Arc<dyn RateLimiterPort>,
        collaborators: Collaborators,
        openapi_bridge: Arc<dyn OpenApiBridgePort>,
        openapi_document: Value,
    ) -> Self {
        Self {
            api_base: normalize_path(api_base),
            route_table: Arc::new(route_table),
            rate_limiter,
            collaborators,
            openapi_bridge,
            openapi_document: Arc::new(openapi_document),
        }
    }

    /// 去掉 API base path 后的路径；不在 base path 下时返回 None
    pub fn api_relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.api_base == "/" {
            return Some(path);
        }
        path.strip_prefix(self.api_base.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::extract::Request;
    use axum::response::Response;

    use crate::application::{CollaboratorError, RequestContext};
    use crate::domain::{ApiSurface, VersionedSurfaces};
    use crate::infrastructure::memory::InMemoryRateLimiter;

    struct Unused;

    #[async_trait]
    impl CollaboratorPort for Unused {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            _request: Request,
        ) -> Result<Response, CollaboratorError> {
            Err(CollaboratorError::Unavailable("unused".to_string()))
        }
    }

    #[async_trait]
    impl OpenApiBridgePort for Unused {
        async fn handle(
            &self,
            _ctx: &RequestContext,
            _surface: ApiSurface,
            _request: Request,
        ) -> Result<Response, CollaboratorError> {
            Err(CollaboratorError::Unavailable("unused".to_string()))
        }
    }

    fn state(api_base: &str) -> AppState {
        let surfaces =
            VersionedSurfaces::resolve(api_base, "/api/v2", "/api/v2-beta").unwrap();
        let table = RouteTable::new(&surfaces, Vec::new()).unwrap();
        let unused: Arc<dyn CollaboratorPort> = Arc::new(Unused);
        let collaborators = Collaborators {
            auth: unused.clone(),
            files: unused.clone(),
            ai: unused.clone(),
            rest_v1: unused.clone(),
            jobs: unused.clone(),
            trpc: unused.clone(),
            download: unused,
        };
        AppState::new(
            api_base,
            table,
            Arc::new(InMemoryRateLimiter::default()),
            collaborators,
            Arc::new(Unused),
            Value::Null,
        )
    }

    #[test]
    fn test_api_relative_path() {
        let state = state("/api");
        assert_eq!(state.api_relative_path("/api/auth/session"), Some("/auth/session"));
        assert_eq!(state.api_relative_path("/api"), Some(""));
        assert_eq!(state.api_relative_path("/apix/auth"), None);
        assert_eq!(state.api_relative_path("/health"), None);
    }

    #[test]
    fn test_api_base_trailing_slash_is_normalized() {
        let state = state("/api/");
        assert_eq!(state.api_base, "/api");
        assert_eq!(state.api_relative_path("/api/auth/x"), Some("/auth/x"));
        assert_eq!(state.api_relative_path("/api/v2/document"), Some("/v2/document"));
    }
}

//! HTTP Routes
//!
//! 按挂载表构建路由，所有路径位于 API base path（默认 `/api`）之下:
//! - /auth/*                 auth 服务
//! - /files/*                文件服务
//! - /ai/*                   AI 服务（AI 限流）
//! - /v1/*                   v1 REST API（通用限流 + CORS）
//! - /jobs/*                 后台任务服务
//! - /trpc/*                 tRPC 服务
//! - /v2/openapi.json        OpenAPI 文档
//! - /v2/*                   下载服务，否则 bridge（通用限流 + CORS）
//! - /v2-beta/*              同 /v2，bridge 收到 is_beta = true
//!
//! 版本分组内顺序固定：openapi.json > CORS > 下载 > bridge。
//! 下载路由注册为显式路由、bridge 作为分组 fallback，因此下载请求永远不会进入 bridge

use axum::{
    extract::{Request, State},
    middleware,
    routing::get,
    Extension, Router,
};
use http::Method;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};

use super::handlers;
use super::rate_limit::{enforce_rate_limit, RateLimitGate};
use super::state::AppState;
use crate::application::RequestContext;
use crate::domain::{ApiSurface, CollaboratorKind, RouteTarget, OPENAPI_DOCUMENT_PATH};

/// 创建所有路由
pub fn create_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let mut api = Router::new();

    for entry in state.route_table.entries() {
        let mount = match entry.target {
            RouteTarget::Collaborator(kind) => collaborator_routes(kind, entry.cors),
            RouteTarget::Versioned(surface) => {
                versioned_routes(surface, state.route_table.download_routes())
            }
        };

        let mount = match entry.rate_limit {
            Some(tier) => mount.layer(middleware::from_fn_with_state(
                RateLimitGate::new(state.rate_limiter.clone(), tier),
                enforce_rate_limit,
            )),
            None => mount,
        };

        api = api.nest(&entry.prefix, mount);
    }

    let api = api.fallback(handlers::route_not_found);

    if state.api_base == "/" {
        api
    } else {
        Router::new()
            .nest(&state.api_base, api)
            .fallback(handlers::route_not_found)
    }
}

/// 整个前缀交给一个协作服务
fn collaborator_routes(kind: CollaboratorKind, cors: bool) -> Router<Arc<AppState>> {
    let delegate = move |State(state): State<Arc<AppState>>,
                         Extension(ctx): Extension<RequestContext>,
                         request: Request| {
        handlers::delegate(state, ctx, kind, request)
    };

    let router = Router::new().fallback(delegate);
    if cors {
        router.layer(permissive_cors())
    } else {
        router
    }
}

/// 版本分组
fn versioned_routes(surface: ApiSurface, download_routes: &[String]) -> Router<Arc<AppState>> {
    let bridge = move |State(state): State<Arc<AppState>>,
                       Extension(ctx): Extension<RequestContext>,
                       request: Request| {
        handlers::bridge(state, ctx, surface, request)
    };
    let download = |State(state): State<Arc<AppState>>,
                    Extension(ctx): Extension<RequestContext>,
                    request: Request| {
        handlers::delegate(state, ctx, CollaboratorKind::Download, request)
    };

    // 下载路由必须先于 bridge；非 GET 请求落回 bridge
    let mut gated = Router::new();
    for route in download_routes {
        gated = gated.route(route, get(download).fallback(bridge));
    }
    let gated = gated.fallback(bridge).layer(permissive_cors());

    Router::new()
        .route(
            OPENAPI_DOCUMENT_PATH,
            get(handlers::openapi_document).fallback(bridge),
        )
        .merge(gated)
}

/// 允许所有来源的跨域请求，预检请求的头原样放行
fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers(Any)
}

//! Inkgate - API 边缘路由
//!
//! 启动顺序：配置 > 日志 > 挂载表 > 协作服务适配器 > 限流 > HTTP 服务器

use std::sync::Arc;

use inkgate::config::{load_config, print_config, AppConfig};
use inkgate::domain::{RouteTable, VersionedSurfaces};
use inkgate::infrastructure::adapters::{
    build_upstream_client, load_openapi_document, HttpOpenApiBridge, HttpUpstream,
    HttpUpstreamConfig,
};
use inkgate::infrastructure::http::{AppState, Collaborators, HttpServer, ServerConfig};
use inkgate::infrastructure::memory::InMemoryRateLimiter;
use inkgate::infrastructure::worker::{RateLimitSweeper, RateLimitSweeperConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Inkgate - API edge router");
    print_config(&config);

    // 挂载表
    let surfaces = VersionedSurfaces::resolve(
        &config.api.base_path,
        &config.api.v2_url,
        &config.api.v2_beta_url,
    )?;
    let route_table = RouteTable::new(&surfaces, config.download.routes.clone())?;

    // 协作服务共享一个连接池
    let client = build_upstream_client()?;
    let upstream = |name: &str, url: &str| -> Arc<HttpUpstream> {
        Arc::new(HttpUpstream::with_client(
            client.clone(),
            upstream_config(&config, name, url),
        ))
    };

    let collaborators = Collaborators {
        auth: upstream("auth", &config.upstream.auth_url),
        files: upstream("files", &config.upstream.files_url),
        ai: upstream("ai", &config.upstream.ai_url),
        rest_v1: upstream("v1", &config.upstream.v1_url),
        jobs: upstream("jobs", &config.upstream.jobs_url),
        trpc: upstream("trpc", &config.upstream.trpc_url),
        download: upstream("download", &config.upstream.download_url),
    };
    let openapi_bridge = Arc::new(HttpOpenApiBridge::new(HttpUpstream::with_client(
        client.clone(),
        upstream_config(&config, "bridge", &config.upstream.bridge_url),
    )));

    let openapi_document =
        load_openapi_document(config.openapi.document_path.as_deref(), &config.api.v2_url)?;

    // 限流计数 + 过期窗口清理
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(
        config.rate_limit.api_policy(),
        config.rate_limit.ai_policy(),
    ));
    let sweeper = RateLimitSweeper::new(
        RateLimitSweeperConfig {
            interval: config.rate_limit.sweep_interval(),
        },
        rate_limiter.clone(),
    );
    tokio::spawn(sweeper.run());

    let state = AppState::new(
        &config.api.base_path,
        route_table,
        rate_limiter,
        collaborators,
        openapi_bridge,
        openapi_document,
    );

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},inkgate={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

fn upstream_config(config: &AppConfig, name: &str, url: &str) -> HttpUpstreamConfig {
    HttpUpstreamConfig::new(name, url)
        .with_timeout(config.upstream.timeout_secs)
        .with_max_body_bytes(config.server.max_body_bytes)
}

//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{RateLimitPolicy, DEFAULT_DOWNLOAD_ROUTES};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// API 路径配置
    #[serde(default)]
    pub api: ApiConfig,

    /// 限流配置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// 协作服务地址
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// 下载路由
    #[serde(default)]
    pub download: DownloadConfig,

    /// OpenAPI 文档
    #[serde(default)]
    pub openapi: OpenApiConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 转发给协作服务的请求体上限（字节）
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024 // 50 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// API 路径配置
///
/// v2 分组的挂载路径由 URL 去掉 base path 得到
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_path")]
    pub base_path: String,

    #[serde(default = "default_v2_url")]
    pub v2_url: String,

    #[serde(default = "default_v2_beta_url")]
    pub v2_beta_url: String,
}

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_v2_url() -> String {
    "/api/v2".to_string()
}

fn default_v2_beta_url() -> String {
    "/api/v2-beta".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            v2_url: default_v2_url(),
            v2_beta_url: default_v2_beta_url(),
        }
    }
}

/// 限流配置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// 窗口长度（秒）
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// 通用层级：每窗口请求数
    #[serde(default = "default_api_limit")]
    pub api_limit: u32,

    /// AI 层级：每窗口请求数
    #[serde(default = "default_ai_limit")]
    pub ai_limit: u32,

    /// 过期计数清理间隔（秒）
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_window_secs() -> u64 {
    60
}

fn default_api_limit() -> u32 {
    100
}

fn default_ai_limit() -> u32 {
    3
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            api_limit: default_api_limit(),
            ai_limit: default_ai_limit(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn api_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.api_limit, self.window())
    }

    pub fn ai_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.ai_limit, self.window())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// 协作服务地址
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub auth_url: String,

    #[serde(default = "default_upstream_url")]
    pub files_url: String,

    #[serde(default = "default_upstream_url")]
    pub ai_url: String,

    #[serde(default = "default_upstream_url")]
    pub v1_url: String,

    #[serde(default = "default_upstream_url")]
    pub jobs_url: String,

    #[serde(default = "default_upstream_url")]
    pub trpc_url: String,

    #[serde(default = "default_upstream_url")]
    pub download_url: String,

    /// tRPC-to-REST bridge
    #[serde(default = "default_upstream_url")]
    pub bridge_url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_upstream_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_upstream_timeout() -> u64 {
    120
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            auth_url: default_upstream_url(),
            files_url: default_upstream_url(),
            ai_url: default_upstream_url(),
            v1_url: default_upstream_url(),
            jobs_url: default_upstream_url(),
            trpc_url: default_upstream_url(),
            download_url: default_upstream_url(),
            bridge_url: default_upstream_url(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl UpstreamConfig {
    /// 按名称列出所有地址，用于校验和启动日志
    pub fn urls(&self) -> [(&'static str, &str); 8] {
        [
            ("auth", &self.auth_url),
            ("files", &self.files_url),
            ("ai", &self.ai_url),
            ("v1", &self.v1_url),
            ("jobs", &self.jobs_url),
            ("trpc", &self.trpc_url),
            ("download", &self.download_url),
            ("bridge", &self.bridge_url),
        ]
    }
}

/// 下载路由配置，路径相对于 v2 分组
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_routes")]
    pub routes: Vec<String>,
}

fn default_download_routes() -> Vec<String> {
    DEFAULT_DOWNLOAD_ROUTES.iter().map(|s| s.to_string()).collect()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            routes: default_download_routes(),
        }
    }
}

/// OpenAPI 文档配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiConfig {
    /// 预生成的文档路径；未设置时使用内置文档
    #[serde(default)]
    pub document_path: Option<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::domain::{RouteTable, VersionedSurfaces};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `INKGATE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `INKGATE_SERVER__PORT=8080`
/// - `INKGATE_API__V2_BETA_URL=/api/v2-beta`
/// - `INKGATE_RATE_LIMIT__AI_LIMIT=5`
/// - `INKGATE_UPSTREAM__TRPC_URL=http://remix:3000`
/// - `INKGATE_DOWNLOAD__ROUTES=/a/:id/download,/a/:id/download/:version`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    let defaults = AppConfig::default();
    builder = builder
        .set_default("server.host", defaults.server.host)?
        .set_default("server.port", defaults.server.port)?
        .set_default("server.max_body_bytes", defaults.server.max_body_bytes as u64)?
        .set_default("api.base_path", defaults.api.base_path)?
        .set_default("api.v2_url", defaults.api.v2_url)?
        .set_default("api.v2_beta_url", defaults.api.v2_beta_url)?
        .set_default("rate_limit.window_secs", defaults.rate_limit.window_secs)?
        .set_default("rate_limit.api_limit", defaults.rate_limit.api_limit)?
        .set_default("rate_limit.ai_limit", defaults.rate_limit.ai_limit)?
        .set_default(
            "rate_limit.sweep_interval_secs",
            defaults.rate_limit.sweep_interval_secs,
        )?
        .set_default("upstream.timeout_secs", defaults.upstream.timeout_secs)?
        .set_default("download.routes", defaults.download.routes)?
        .set_default("log.level", defaults.log.level)?
        .set_default("log.json", defaults.log.json)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量
    // 例如: INKGATE_UPSTREAM__AUTH_URL=http://auth:3000
    // 下载路由以逗号分隔
    builder = builder.add_source(
        Environment::with_prefix("INKGATE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("download.routes")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
///
/// 同时检查挂载路径能否推导、是否冲突
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.rate_limit.window_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Rate limit window cannot be 0".to_string(),
        ));
    }

    if config.rate_limit.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Rate limit sweep interval cannot be 0".to_string(),
        ));
    }

    for (name, url) in config.upstream.urls() {
        if url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Upstream URL for {} cannot be empty",
                name
            )));
        }
    }

    let surfaces = VersionedSurfaces::resolve(
        &config.api.base_path,
        &config.api.v2_url,
        &config.api.v2_beta_url,
    )
    .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    RouteTable::new(&surfaces, config.download.routes.clone())
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Max Body Size: {} bytes", config.server.max_body_bytes);
    tracing::info!("API Base Path: {}", config.api.base_path);
    tracing::info!("V2 URL: {}", config.api.v2_url);
    tracing::info!("V2 Beta URL: {}", config.api.v2_beta_url);
    tracing::info!(
        "Rate Limit: api {}/{}s, ai {}/{}s",
        config.rate_limit.api_limit,
        config.rate_limit.window_secs,
        config.rate_limit.ai_limit,
        config.rate_limit.window_secs
    );
    for (name, url) in config.upstream.urls() {
        tracing::info!("Upstream {}: {}", name, url);
    }
    tracing::info!("Upstream Timeout: {}s", config.upstream.timeout_secs);
    tracing::info!("Download Routes: {:?}", config.download.routes);
    match &config.openapi.document_path {
        Some(path) => tracing::info!("OpenAPI Document: {}", path.display()),
        None => tracing::info!("OpenAPI Document: built-in"),
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_window() {
        let mut config = AppConfig::default();
        config.rate_limit.window_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_upstream() {
        let mut config = AppConfig::default();
        config.upstream.bridge_url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_url_outside_base() {
        let mut config = AppConfig::default();
        config.api.v2_url = "/public/v2".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_colliding_surfaces() {
        let mut config = AppConfig::default();
        config.api.v2_beta_url = "/api/v2".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_download_route() {
        let mut config = AppConfig::default();
        config.download.routes = vec!["envelope/download".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[rate_limit]
ai_limit = 5

[upstream]
trpc_url = "http://remix:3000"

[download]
routes = ["/files/:id/download"]
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rate_limit.ai_limit, 5);
        assert_eq!(config.rate_limit.api_limit, 100);
        assert_eq!(config.upstream.trpc_url, "http://remix:3000");
        assert_eq!(config.upstream.auth_url, "http://localhost:3000");
        assert_eq!(config.download.routes, vec!["/files/:id/download".to_string()]);
        assert_eq!(config.api.v2_url, "/api/v2");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config_from_path(Some(&missing)).is_err());
    }
}

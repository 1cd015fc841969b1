//! Versioned API Surfaces
//!
//! 启动时从配置的 base URL 推导 v2 / v2-beta 分组路径

use thiserror::Error;

/// 路径解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfacePathError {
    #[error("Base path must start with '/': {0}")]
    InvalidBasePath(String),

    #[error("API URL {url} is not under base path {base}")]
    NotUnderBase { url: String, base: String },

    #[error("API URL {0} resolves to an empty group path")]
    EmptyGroup(String),

    #[error("Stable and beta API groups collide at {0}")]
    Collision(String),
}

/// 不稳定 API 分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSurface {
    Stable,
    Beta,
}

impl ApiSurface {
    /// 传给 bridge 的 beta 开关
    pub fn is_beta(&self) -> bool {
        matches!(self, ApiSurface::Beta)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSurface::Stable => "v2",
            ApiSurface::Beta => "v2-beta",
        }
    }
}

/// 两个版本分组相对于 base path 的挂载路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSurfaces {
    stable: String,
    beta: String,
}

impl VersionedSurfaces {
    /// 从 base path 与两个 API URL 常量推导分组路径
    ///
    /// 例如 base `/api`、URL `/api/v2` 得到 `/v2`
    pub fn resolve(
        base_path: &str,
        stable_url: &str,
        beta_url: &str,
    ) -> Result<Self, SurfacePathError> {
        let stable = strip_base(base_path, stable_url)?;
        let beta = strip_base(base_path, beta_url)?;

        if stable == beta {
            return Err(SurfacePathError::Collision(stable));
        }

        Ok(Self { stable, beta })
    }

    pub fn path(&self, surface: ApiSurface) -> &str {
        match surface {
            ApiSurface::Stable => &self.stable,
            ApiSurface::Beta => &self.beta,
        }
    }
}

/// 去掉 URL 开头的 base path，结果保证以 `/` 开头且不以 `/` 结尾
pub fn strip_base(base_path: &str, url: &str) -> Result<String, SurfacePathError> {
    let base = normalize_path(base_path);
    if !base.starts_with('/') {
        return Err(SurfacePathError::InvalidBasePath(base_path.to_string()));
    }

    let url_norm = normalize_path(url);
    let rest = if base == "/" {
        url_norm.as_str()
    } else {
        url_norm
            .strip_prefix(base.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| SurfacePathError::NotUnderBase {
                url: url.to_string(),
                base: base_path.to_string(),
            })?
    };

    if rest.is_empty() || rest == "/" {
        return Err(SurfacePathError::EmptyGroup(url.to_string()));
    }

    Ok(rest.to_string())
}

/// 去掉首尾空白和末尾的 `/`（根路径 `/` 保持不变）
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.len() > 1 {
        trimmed.trim_end_matches('/').to_string()
    } else {
        trimmed.to_string()
    }
}

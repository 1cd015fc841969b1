//! OpenAPI Document - 静态 OpenAPI 文档加载
//!
//! 启动时加载一次：优先读取配置的 JSON 文件，未配置时使用内置的最小文档

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 文档加载错误
#[derive(Debug, Error)]
pub enum OpenApiDocumentError {
    #[error("Failed to read OpenAPI document {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse OpenAPI document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("OpenAPI document {0} is not a JSON object")]
    NotAnObject(PathBuf),
}

/// 加载 OpenAPI 文档
///
/// `server_url` 仅用于内置文档的 `servers` 字段
pub fn load_openapi_document(
    path: Option<&Path>,
    server_url: &str,
) -> Result<Value, OpenApiDocumentError> {
    let Some(path) = path else {
        tracing::info!("No OpenAPI document configured, serving built-in document");
        return Ok(builtin_document(server_url));
    };

    let raw = std::fs::read(path).map_err(|source| OpenApiDocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value =
        serde_json::from_slice(&raw).map_err(|source| OpenApiDocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if !document.is_object() {
        return Err(OpenApiDocumentError::NotAnObject(path.to_path_buf()));
    }

    let path_count = document
        .get("paths")
        .and_then(Value::as_object)
        .map(|p| p.len())
        .unwrap_or(0);
    tracing::info!(
        path = %path.display(),
        paths = path_count,
        "OpenAPI document loaded"
    );
    Ok(document)
}

/// 内置的最小 OpenAPI 3 文档
pub fn builtin_document(server_url: &str) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Document Signing API",
            "version": "2.0.0",
            "description": "Unstable v2 API. Paths are served by the tRPC-to-REST bridge."
        },
        "servers": [{ "url": server_url }],
        "paths": {}
    })
}

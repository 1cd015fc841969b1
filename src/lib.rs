//! Inkgate - 文档签署应用的 API 边缘路由
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 请求 ID、限流 key、固定窗口限流
//! - 版本分组路径推导与挂载表
//!
//! 应用层 (application/):
//! - Context: 单次请求上下文（request_id + 日志 span）
//! - Ports: 协作服务、OpenAPI bridge、限流计数
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 路由、中间件、限流闸门
//! - Memory: 限流计数内存实现
//! - Worker: 过期窗口清理
//! - Adapters: 上游 HTTP 转发、OpenAPI 文档加载

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod openapi_document;
pub mod upstream;

pub use openapi_document::{builtin_document, load_openapi_document, OpenApiDocumentError};
pub use upstream::*;

//! HTTP Handlers

mod delegate;
mod openapi;

pub use delegate::*;
pub use openapi::*;

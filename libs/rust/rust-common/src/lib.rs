//! Shared library for cross-cutting concerns in the xtamtmpl Rust crates.
//!
//! This crate provides:
//! - HTTP client configuration and building, with optional cookie store
//! - Tracing subscriber setup for applications

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod http;
pub mod tracing_config;

pub use http::{HttpConfig, build_http_client_with_cookies};
pub use tracing_config::{TracingConfig, init_tracing, try_init_tracing};

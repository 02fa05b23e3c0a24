//! Shared test utilities for the xtamtmpl Rust libraries.
//!
//! This crate provides:
//! - Proptest generators for folder listings and payloads
//! - Fixtures with XTAM response bodies
//! - Tracing setup for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

use rust_common::{TracingConfig, try_init_tracing};

/// Install a debug-level subscriber so failing tests show what the client did.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// `RUST_LOG` overrides the default `debug` level.
pub fn init_test_tracing() {
    let _ = try_init_tracing(&TracingConfig::default().with_log_level("debug"));
}

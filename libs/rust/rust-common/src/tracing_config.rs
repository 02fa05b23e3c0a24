//! Tracing subscriber setup.
//!
//! The libraries only emit `tracing` events; whichever application renders
//! templates installs the subscriber once at startup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
    /// Write events to stderr instead of stdout
    pub stderr: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: false,
            stderr: true,
        }
    }
}

impl TracingConfig {
    /// Set the default log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Write to stdout instead of stderr.
    #[must_use]
    pub const fn with_stdout(mut self) -> Self {
        self.stderr = false;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Install the global subscriber, returning `false` if one is already set.
///
/// Rendered configuration is often written to stdout, so events go to stderr
/// unless the config says otherwise.
pub fn try_init_tracing(config: &TracingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.filter());

    match (config.json_output, config.stderr) {
        (true, true) => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .is_ok(),
        (true, false) => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok(),
        (false, true) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .is_ok(),
        (false, false) => registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok(),
    }
}

/// Install the global subscriber.
///
/// Should be called once at application startup. A second call is a no-op
/// and logs a warning.
pub fn init_tracing(config: &TracingConfig) {
    if !try_init_tracing(config) {
        tracing::warn!("tracing subscriber already installed");
    }
}

//! HTTP transport configuration and building.
//!
//! Every xtamtmpl client talks to the vault through a reqwest client built
//! here, so timeouts, TLS and the user agent stay consistent. Session-based
//! services additionally hand in the cookie store the client must use.

use reqwest::cookie::CookieStore;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Accept invalid TLS certificates (default: false)
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("xtamtmpl/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
        }
    }
}

impl HttpConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Accept self-signed or otherwise invalid server certificates.
    ///
    /// Only meant for lab installations of the vault.
    #[must_use]
    pub const fn with_invalid_certs_accepted(mut self) -> Self {
        self.accept_invalid_certs = true;
        self
    }

    fn builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .use_rustls_tls()
    }
}

/// Build a configured HTTP client that stores and replays cookies through
/// `cookie_store`.
///
/// The caller keeps its own handle on the store, which is how session-based
/// authenticators observe whether the server has handed out a session.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn build_http_client_with_cookies<C>(
    config: &HttpConfig,
    cookie_store: Arc<C>,
) -> Result<Client, reqwest::Error>
where
    C: CookieStore + 'static,
{
    config.builder().cookie_provider(cookie_store).build()
}

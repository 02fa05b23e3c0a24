//! XTAM client configuration.

use crate::error::ConfigError;
use rust_common::HttpConfig;
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Environment variable holding the XTAM base URL.
pub const XTAM_HOST_ENV: &str = "XTAM_HOST";
/// Environment variable holding the CAS URL.
pub const XTAM_CAS_HOST_ENV: &str = "XTAM_CAS_HOST";
/// Environment variable holding the CAS user name.
pub const XTAM_USERNAME_ENV: &str = "XTAM_USERNAME";
/// Environment variable holding the CAS password.
pub const XTAM_PASSWORD_ENV: &str = "XTAM_PASSWORD";
/// Environment variable holding the folder to resolve names in.
pub const XTAM_FOLDER_ID_ENV: &str = "XTAM_FOLDER_ID";
/// Environment variable overriding the request timeout, in seconds.
pub const XTAM_TIMEOUT_SECS_ENV: &str = "XTAM_TIMEOUT_SECS";
/// Environment variable overriding the connect timeout, in seconds.
pub const XTAM_CONNECT_TIMEOUT_SECS_ENV: &str = "XTAM_CONNECT_TIMEOUT_SECS";
/// Environment variable enabling re-authentication on `401` responses.
pub const XTAM_REAUTH_ON_EXPIRY_ENV: &str = "XTAM_REAUTH_ON_EXPIRY";

/// XTAM client configuration.
#[derive(Debug, Clone)]
pub struct XtamConfig {
    /// XTAM base URL, without trailing slash
    pub base_url: String,
    /// CAS base URL, without trailing slash
    pub cas_url: String,
    /// CAS user name
    pub username: String,
    /// CAS password
    pub password: SecretString,
    /// Folder whose records templates may reference
    pub folder_id: String,
    /// HTTP transport settings
    pub http: HttpConfig,
    /// Clear the session and retry once when an authenticated request gets `401`
    pub reauthenticate_on_expiry: bool,
}

impl XtamConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        cas_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: trim_url(base_url.into()),
            cas_url: trim_url(cas_url.into()),
            username: username.into(),
            password: SecretString::from(password.into()),
            folder_id: String::new(),
            http: HttpConfig::default(),
            reauthenticate_on_expiry: false,
        }
    }

    /// Load configuration from the environment, reading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let mut config = Self::new(
            required(XTAM_HOST_ENV)?,
            required(XTAM_CAS_HOST_ENV)?,
            required(XTAM_USERNAME_ENV)?,
            required(XTAM_PASSWORD_ENV)?,
        )
        .with_folder_id(required(XTAM_FOLDER_ID_ENV)?);

        if let Some(timeout) = seconds(&lookup, XTAM_TIMEOUT_SECS_ENV)? {
            config = config.with_timeout(timeout);
        }
        if let Some(timeout) = seconds(&lookup, XTAM_CONNECT_TIMEOUT_SECS_ENV)? {
            config = config.with_connect_timeout(timeout);
        }

        if let Some(flag) = lookup(XTAM_REAUTH_ON_EXPIRY_ENV) {
            let flag: bool = flag
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(XTAM_REAUTH_ON_EXPIRY_ENV, format!("{e}")))?;
            config = config.with_reauthenticate_on_expiry(flag);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the folder ID.
    #[must_use]
    pub fn with_folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = folder_id.into();
        self
    }

    /// Set the HTTP transport settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_connect_timeout(timeout);
        self
    }

    /// Enable or disable re-authentication on `401` responses.
    #[must_use]
    pub const fn with_reauthenticate_on_expiry(mut self, enabled: bool) -> Self {
        self.reauthenticate_on_expiry = enabled;
        self
    }

    /// Check that both URLs are usable and credentials are present.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        self.parsed_cas_url()?;
        if self.username.is_empty() {
            return Err(ConfigError::Missing(XTAM_USERNAME_ENV));
        }
        Ok(())
    }

    /// Base URL as a parsed [`Url`].
    ///
    /// # Errors
    ///
    /// Returns an error unless the URL is absolute `http` or `https`.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        parse_http_url(XTAM_HOST_ENV, &self.base_url)
    }

    /// CAS URL as a parsed [`Url`].
    ///
    /// # Errors
    ///
    /// Returns an error unless the URL is absolute `http` or `https`.
    pub fn parsed_cas_url(&self) -> Result<Url, ConfigError> {
        parse_http_url(XTAM_CAS_HOST_ENV, &self.cas_url)
    }
}

fn seconds<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|secs| {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::invalid(name, format!("{e}")))
        })
        .transpose()
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::invalid(name, format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::invalid(
            name,
            format!("unsupported scheme '{other}' in {raw}"),
        )),
    }
}

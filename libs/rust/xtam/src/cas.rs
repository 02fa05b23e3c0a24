//! CAS session authentication.
//!
//! XTAM sits behind a CAS server and identifies callers by session cookie.
//! A session is established with three calls: credentials are exchanged for
//! a ticket-granting ticket (TGT), the TGT for a service ticket, and the
//! service ticket is redeemed against XTAM, which answers with the session
//! cookie. An empty cookie jar is the only signal that this has to happen.

use crate::config::XtamConfig;
use crate::error::{AuthError, AuthStep, XtamResult};
use crate::provider::RequestAuthenticator;
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, LOCATION};
use reqwest::{Client, Request, Response, StatusCode};
use rust_common::build_http_client_with_cookies;
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// In-memory cookie store that can be emptied.
///
/// Wraps reqwest's [`Jar`]; clearing swaps in a fresh one.
#[derive(Default)]
pub struct SessionJar {
    inner: RwLock<Jar>,
}

impl std::fmt::Debug for SessionJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionJar").finish_non_exhaustive()
    }
}

impl SessionJar {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any cookie would be sent to `url`.
    #[must_use]
    pub fn has_cookies(&self, url: &Url) -> bool {
        self.cookies(url).is_some()
    }

    /// Drop every stored cookie.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}

/// CAS-authenticated HTTP session against one XTAM instance.
pub struct CasSession {
    base_url: String,
    base: Url,
    cas_url: String,
    username: String,
    password: SecretString,
    reauthenticate_on_expiry: bool,
    jar: Arc<SessionJar>,
    http: Client,
    login: Mutex<()>,
}

impl std::fmt::Debug for CasSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasSession")
            .field("base_url", &self.base_url)
            .field("cas_url", &self.cas_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl CasSession {
    /// Create a session with an empty cookie jar. Nothing is sent until the
    /// first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &XtamConfig) -> XtamResult<Self> {
        config.validate()?;
        let base = config.parsed_base_url()?;
        let jar = Arc::new(SessionJar::new());
        let http = build_http_client_with_cookies(&config.http, Arc::clone(&jar))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            base,
            cas_url: config.cas_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            reauthenticate_on_expiry: config.reauthenticate_on_expiry,
            jar,
            http,
            login: Mutex::new(()),
        })
    }

    /// XTAM base URL this session authenticates against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the jar holds a cookie for the base URL.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.jar.has_cookies(&self.base)
    }

    /// Forget the session; the next request authenticates again.
    pub fn clear_session(&self) {
        self.jar.clear();
    }

    /// Make sure a session exists, authenticating if the jar is empty.
    ///
    /// Concurrent callers share one login attempt. If XTAM accepts the
    /// service ticket without setting a cookie, the jar stays empty and
    /// every later call runs the whole CAS exchange again.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the failed exchange.
    pub async fn ensure_session(&self) -> Result<(), AuthError> {
        if self.is_authenticated() {
            return Ok(());
        }

        let _login = self.login.lock().await;
        if self.is_authenticated() {
            return Ok(());
        }

        self.authenticate().await
    }

    /// Replace the session XTAM rejected, unless another caller already has.
    ///
    /// `rejected` is the cookie header the failed request carried.
    async fn renew_session(&self, rejected: Option<&HeaderValue>) -> Result<(), AuthError> {
        let _login = self.login.lock().await;
        if self.jar.cookies(&self.base).as_ref() != rejected {
            debug!("session already renewed");
            return Ok(());
        }

        warn!("XTAM rejected the session, authenticating again");
        self.jar.clear();
        self.authenticate().await
    }

    #[instrument(skip(self), fields(username = %self.username, cas = %self.cas_url))]
    async fn authenticate(&self) -> Result<(), AuthError> {
        let tgt_url = self.request_granting_ticket().await?;
        let service_ticket = self.request_service_ticket(tgt_url).await?;
        self.redeem_service_ticket(&service_ticket).await?;

        if self.is_authenticated() {
            info!("authenticated with XTAM");
        } else {
            warn!("service ticket redeemed but XTAM set no session cookie");
        }
        Ok(())
    }

    async fn request_granting_ticket(&self) -> Result<Url, AuthError> {
        const STEP: AuthStep = AuthStep::GrantingTicket;

        let response = self
            .http
            .post(format!("{}/v1/tickets", self.cas_url))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|source| AuthError::Transport { step: STEP, source })?;

        if response.status() != StatusCode::CREATED {
            return Err(unexpected_status(STEP, response).await);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::MissingTicketLocation)?;

        response
            .url()
            .join(location)
            .map_err(|e| AuthError::InvalidTicketLocation(e.to_string()))
    }

    async fn request_service_ticket(&self, tgt_url: Url) -> Result<String, AuthError> {
        const STEP: AuthStep = AuthStep::ServiceTicket;

        let response = self
            .http
            .post(tgt_url)
            .form(&[("service", format!("{}/", self.base_url))])
            .send()
            .await
            .map_err(|source| AuthError::Transport { step: STEP, source })?;

        if response.status() != StatusCode::OK {
            return Err(unexpected_status(STEP, response).await);
        }

        let ticket = response
            .text()
            .await
            .map_err(|source| AuthError::Transport { step: STEP, source })?;

        if ticket.is_empty() {
            return Err(AuthError::EmptyServiceTicket);
        }
        debug!("obtained service ticket");
        Ok(ticket)
    }

    async fn redeem_service_ticket(&self, ticket: &str) -> Result<(), AuthError> {
        const STEP: AuthStep = AuthStep::SessionCookie;

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("ticket", ticket)])
            .send()
            .await
            .map_err(|source| AuthError::Transport { step: STEP, source })?;

        if response.status() != StatusCode::OK {
            return Err(unexpected_status(STEP, response).await);
        }
        Ok(())
    }
}

async fn unexpected_status(step: AuthStep, response: Response) -> AuthError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    warn!(%step, status, "unexpected status from CAS exchange");
    AuthError::unexpected_status(step, status, &body)
}

#[async_trait]
impl RequestAuthenticator for CasSession {
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.url().path()))]
    async fn execute(&self, request: Request) -> XtamResult<Response> {
        let retry = if self.reauthenticate_on_expiry {
            request.try_clone()
        } else {
            None
        };

        self.ensure_session().await?;
        let sent_with = self.jar.cookies(&self.base);
        let response = self.http.execute(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(retry) = retry {
                self.renew_session(sent_with.as_ref()).await?;
                return Ok(self.http.execute(retry).await?);
            }
        }

        Ok(response)
    }
}

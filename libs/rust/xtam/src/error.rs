//! XTAM error types using thiserror 2.0.
//!
//! One enum per layer: [`AuthError`] for the CAS ticket exchange,
//! [`ApiError`] for the REST endpoints and payload decoding,
//! [`ResolutionError`] for the template-facing name index. [`XtamError`]
//! wraps all of them so callers can `?` across layers.

use crate::records::RecordKind;
use std::fmt;
use thiserror::Error;

/// Step of the CAS exchange an [`AuthError`] happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    /// `POST <cas>/v1/tickets`
    GrantingTicket,
    /// `POST <tgt-url>`
    ServiceTicket,
    /// `GET <base>?ticket=...`
    SessionCookie,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GrantingTicket => "obtaining ticket-granting ticket",
            Self::ServiceTicket => "obtaining service ticket",
            Self::SessionCookie => "redeeming service ticket",
        })
    }
}

/// CAS ticket protocol failures.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A step answered with a status other than the expected one
    #[error("unexpected status code {status} while {step}")]
    UnexpectedStatus {
        /// Failing step
        step: AuthStep,
        /// HTTP status received
        status: u16,
        /// Leading part of the response body, for diagnostics
        detail: String,
    },

    /// The TGT response carried no usable `Location` header
    #[error("authentication failure (unable to obtain TGT location from CAS)")]
    MissingTicketLocation,

    /// The `Location` header could not be turned into a URL
    #[error("invalid TGT location: {0}")]
    InvalidTicketLocation(String),

    /// The service ticket response body was empty
    #[error("unable to obtain service ticket (empty response from CAS)")]
    EmptyServiceTicket,

    /// The request of a step could not be sent or its body not read
    #[error("request failed while {step}")]
    Transport {
        /// Failing step
        step: AuthStep,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },
}

impl AuthError {
    const DETAIL_LIMIT: usize = 512;

    /// Create an unexpected status error, keeping at most the first 512
    /// characters of the response body.
    #[must_use]
    pub fn unexpected_status(step: AuthStep, status: u16, body: &str) -> Self {
        Self::UnexpectedStatus {
            step,
            status,
            detail: body.chars().take(Self::DETAIL_LIMIT).collect(),
        }
    }
}

/// REST API and payload decoding failures.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Endpoint answered with a non-200 status
    #[error("unexpected response {status} from {path}")]
    UnexpectedStatus {
        /// Request path
        path: String,
        /// HTTP status received
        status: u16,
    },

    /// JSON body or nested document could not be decoded
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// What was being decoded
        what: &'static str,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Record has a different type than the operation requires
    #[error("wanted {expected} but got {actual}")]
    TypeMismatch {
        /// Required record type
        expected: &'static str,
        /// Declared record type
        actual: String,
    },

    /// Nested document lacks the field carrying the value
    #[error("record document has no '{0}' field")]
    MissingField(&'static str),

    /// Certificate data is not a base64 data URI
    #[error("expecting base64 encoded certificate data, got: {0}")]
    MalformedCertificateData(String),

    /// Certificate payload is not valid base64
    #[error("invalid base64 certificate payload: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Endpoint URL could not be built
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Create a decode error.
    #[must_use]
    pub const fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }
}

/// Name index failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolutionError {
    /// Two records share a name ignoring case
    #[error("container has repeated record with name {name} (first type {first}, second type {second})")]
    DuplicateName {
        /// Display name of the second record
        name: String,
        /// Type of the record indexed first
        first: String,
        /// Type of the colliding record
        second: String,
    },

    /// No record of the requested kind has that name
    #[error("{kind} '{name}' not found; known {kind}s include: {known:?}")]
    NotFound {
        /// Requested kind
        kind: RecordKind,
        /// Requested name, lowercased
        name: String,
        /// Every known name of that kind, sorted
        known: Vec<String>,
    },
}

/// Configuration failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable not set
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// Variable set to an unusable value
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid setting error.
    #[must_use]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Any failure of the XTAM client stack.
#[derive(Error, Debug)]
pub enum XtamError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CAS authentication error
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// REST API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Name resolution error
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Transport error on an authenticated request
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for XTAM operations.
pub type XtamResult<T> = Result<T, XtamError>;

impl XtamError {
    /// Check if error is retryable.
    ///
    /// Nothing in this crate retries; the classification is for callers that
    /// wrap a whole rendering pass.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) | Self::Auth(AuthError::Transport { source: e, .. }) => {
                e.is_timeout() || e.is_connect()
            }
            Self::Api(ApiError::UnexpectedStatus { status, .. })
            | Self::Auth(AuthError::UnexpectedStatus { status, .. }) => *status >= 500,
            _ => false,
        }
    }
}

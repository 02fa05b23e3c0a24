//! XTAM vault client for template rendering.
//!
//! Authenticates against XTAM through its CAS server, lists folders, unlocks
//! Secret and Certificate records, and resolves the names templates use to
//! those records.
//!
//! ```no_run
//! use secrecy::ExposeSecret;
//! use xtam_client::{NameResolver, XtamConfig};
//!
//! # async fn render() -> xtam_client::XtamResult<()> {
//! let config = XtamConfig::from_env()?;
//! let resolver = NameResolver::from_config(&config).await?;
//! let password = resolver.secret("db-password").await?;
//! let pem = resolver.certificate_pem("web").await?;
//! # let _ = (password.expose_secret(), pem);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cas;
pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod records;
pub mod resolver;

pub use cas::{CasSession, SessionJar};
pub use client::XtamClient;
pub use config::XtamConfig;
pub use error::{ApiError, AuthError, AuthStep, ConfigError, ResolutionError, XtamError, XtamResult};
pub use provider::{RecordStore, RequestAuthenticator};
pub use records::{FolderEntry, Record, RecordKind, RecordType, decode_data_uri};
pub use resolver::{NameIndex, NameResolver};

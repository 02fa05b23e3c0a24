//! Traits at the seams of the XTAM stack.

use crate::error::XtamResult;
use crate::records::FolderEntry;
use async_trait::async_trait;
use reqwest::{Request, Response};
use secrecy::SecretString;

/// Executes a REST call with whatever the service needs to authenticate it.
#[async_trait]
pub trait RequestAuthenticator: Send + Sync {
    /// Execute `request`, authenticating first if needed.
    ///
    /// The response is returned as received, whatever its status.
    async fn execute(&self, request: Request) -> XtamResult<Response>;
}

/// Source of folder listings and unlocked record values.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List the record references in a folder.
    async fn list_container(&self, container_id: &str) -> XtamResult<Vec<FolderEntry>>;

    /// Unlock a Secret record and return its value.
    async fn unlock_secret(&self, id: u64) -> XtamResult<SecretString>;

    /// Unlock a Certificate record and return its PEM bytes.
    async fn unlock_certificate_pem(&self, id: u64) -> XtamResult<Vec<u8>>;
}

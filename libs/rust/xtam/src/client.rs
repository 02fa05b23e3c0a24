//! XTAM REST client.

use crate::{
    cas::CasSession,
    config::XtamConfig,
    error::{ApiError, XtamResult},
    provider::{RecordStore, RequestAuthenticator},
    records::{FolderEntry, Record},
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Request, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

/// XTAM REST client; every request goes through the authenticator.
#[derive(Debug)]
pub struct XtamClient<A = CasSession> {
    base_url: Url,
    authenticator: A,
}

impl XtamClient<CasSession> {
    /// Create a client with a CAS session built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &XtamConfig) -> XtamResult<Self> {
        let session = CasSession::new(config)?;
        Ok(Self {
            base_url: config.parsed_base_url()?,
            authenticator: session,
        })
    }
}

impl<A: RequestAuthenticator> XtamClient<A> {
    /// Create a client for `base_url` that authenticates with `authenticator`.
    #[must_use]
    pub const fn with_authenticator(base_url: Url, authenticator: A) -> Self {
        Self {
            base_url,
            authenticator,
        }
    }

    /// The authenticator requests go through.
    #[must_use]
    pub const fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// List the record references in a folder, in listing order.
    ///
    /// # Errors
    ///
    /// Fails on authentication or transport errors, a non-200 response, or
    /// a body that is not a JSON array of record references.
    #[instrument(skip(self))]
    pub async fn list_container(&self, container_id: &str) -> XtamResult<Vec<FolderEntry>> {
        let url = self.endpoint(&["rest", "folder", "list", container_id])?;
        let entries: Vec<FolderEntry> = self.get_json(url, "folder listing").await?;
        debug!(count = entries.len(), "listed folder");
        Ok(entries)
    }

    /// Unlock a record and decode its envelope. `custom` stays encoded.
    ///
    /// # Errors
    ///
    /// Fails on authentication or transport errors, a non-200 response, or
    /// a malformed envelope.
    #[instrument(skip(self))]
    pub async fn unlock_record(&self, id: u64) -> XtamResult<Record> {
        let url = self.endpoint(&["rest", "record", "unlock", &id.to_string()])?;
        let record: Record = self.get_json(url, "record").await?;
        debug!(record_type = %record.record_type, "unlocked record");
        Ok(record)
    }

    /// Unlock a Secret record and return its value.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::unlock_record`], or if the record is not a Secret
    /// or its document has no value.
    pub async fn unlock_secret(&self, id: u64) -> XtamResult<SecretString> {
        Ok(self.unlock_record(id).await?.secret()?)
    }

    /// Unlock a Certificate record and return its PEM bytes.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::unlock_record`], or if the record is not a
    /// Certificate or its data is not a base64 data URI.
    pub async fn unlock_certificate_pem(&self, id: u64) -> XtamResult<Vec<u8>> {
        Ok(self.unlock_record(id).await?.certificate_pem()?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &'static str) -> XtamResult<T> {
        let path = url.path().to_string();
        let mut request = Request::new(Method::GET, url);
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self.authenticator.execute(request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(%path, status = status.as_u16(), "unexpected response from XTAM");
            return Err(ApiError::UnexpectedStatus {
                path,
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::decode(what, e).into())
    }
}

#[async_trait]
impl<A: RequestAuthenticator> RecordStore for XtamClient<A> {
    async fn list_container(&self, container_id: &str) -> XtamResult<Vec<FolderEntry>> {
        Self::list_container(self, container_id).await
    }

    async fn unlock_secret(&self, id: u64) -> XtamResult<SecretString> {
        Self::unlock_secret(self, id).await
    }

    async fn unlock_certificate_pem(&self, id: u64) -> XtamResult<Vec<u8>> {
        Self::unlock_certificate_pem(self, id).await
    }
}

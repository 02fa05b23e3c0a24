//! XTAM record types and payload decoding.
//!
//! Unlocked records carry their value as JSON text inside the `custom`
//! string of the outer JSON object. Decoding is therefore two-stage: the
//! [`Record`] envelope first, then a per-type document parsed from `custom`.

use crate::error::ApiError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::LazyLock;

/// Name of the Secret record type.
pub const RECORD_TYPE_SECRET: &str = "Secret";

/// Name of the Certificate record type.
pub const RECORD_TYPE_CERTIFICATE: &str = "Certificate";

/// Base64 data with any media type, including none.
#[allow(clippy::expect_used)]
static DATA_URI_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^data:[^;]*;base64,").expect("data URI pattern is valid"));

/// Declared type of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Single secret value
    Secret,
    /// Certificate, possibly with key and chain
    Certificate,
    /// Any other type XTAM knows about
    Other(String),
}

impl RecordType {
    /// Map a record type name to its variant.
    #[must_use]
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            RECORD_TYPE_SECRET => Self::Secret,
            RECORD_TYPE_CERTIFICATE => Self::Certificate,
            _ => Self::Other(name),
        }
    }

    /// Record type name as XTAM spells it.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Secret => RECORD_TYPE_SECRET,
            Self::Certificate => RECORD_TYPE_CERTIFICATE,
            Self::Other(name) => name,
        }
    }
}

/// Record kinds a template can ask for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Secret records
    Secret,
    /// Certificate records
    Certificate,
}

impl RecordKind {
    /// Record type name as XTAM spells it.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Secret => RECORD_TYPE_SECRET,
            Self::Certificate => RECORD_TYPE_CERTIFICATE,
        }
    }

    /// Kind of a record type, if templates can resolve it.
    #[must_use]
    pub const fn of(record_type: &RecordType) -> Option<Self> {
        match record_type {
            RecordType::Secret => Some(Self::Secret),
            RecordType::Certificate => Some(Self::Certificate),
            RecordType::Other(_) => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Secret => "secret",
            Self::Certificate => "certificate",
        })
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for RecordType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            name: String,
        }

        Wire::deserialize(deserializer).map(|wire| Self::from_name(wire.name))
    }
}

/// Reference to a record in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderEntry {
    /// Display name
    pub name: String,
    /// Record ID
    pub id: u64,
    /// Declared type
    #[serde(rename = "recordType")]
    pub record_type: RecordType,
}

/// Unlocked record envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    /// JSON document holding the value, still encoded
    pub custom: String,
    /// Declared type
    #[serde(rename = "recordType")]
    pub record_type: RecordType,
}

#[derive(Deserialize)]
struct SecretDocument {
    #[serde(rename = "Secret")]
    value: Option<String>,
}

#[derive(Deserialize)]
struct CertificateDocument {
    #[serde(rename = "Cert")]
    cert: Option<CertificateBody>,
}

#[derive(Deserialize)]
struct CertificateBody {
    #[serde(rename = "Data")]
    data: Option<String>,
}

impl Record {
    /// Decode the value of a Secret record.
    ///
    /// # Errors
    ///
    /// Fails if the record is not a Secret, if `custom` is not JSON, or if
    /// it has no `Secret` field.
    pub fn secret(&self) -> Result<SecretString, ApiError> {
        self.expect_type(RecordKind::Secret)?;

        let document: SecretDocument = serde_json::from_str(&self.custom)
            .map_err(|e| ApiError::decode("secret document", e))?;

        document
            .value
            .map(SecretString::from)
            .ok_or(ApiError::MissingField("Secret"))
    }

    /// Decode a Certificate record into PEM bytes.
    ///
    /// The result holds whatever XTAM stored: the certificate, and where
    /// applicable its key and chain.
    ///
    /// # Errors
    ///
    /// Fails if the record is not a Certificate, if `custom` is not JSON, if
    /// `Cert.Data` is absent, or if it is not a valid base64 data URI.
    pub fn certificate_pem(&self) -> Result<Vec<u8>, ApiError> {
        self.expect_type(RecordKind::Certificate)?;

        let document: CertificateDocument = serde_json::from_str(&self.custom)
            .map_err(|e| ApiError::decode("certificate document", e))?;

        let data = document
            .cert
            .ok_or(ApiError::MissingField("Cert"))?
            .data
            .ok_or(ApiError::MissingField("Cert.Data"))?;

        decode_data_uri(&data)
    }

    fn expect_type(&self, expected: RecordKind) -> Result<(), ApiError> {
        if RecordKind::of(&self.record_type) == Some(expected) {
            return Ok(());
        }
        Err(ApiError::TypeMismatch {
            expected: expected.type_name(),
            actual: self.record_type.name().to_string(),
        })
    }
}

/// Decode the payload of a `data:<media type>;base64,<payload>` URI.
///
/// The media type is not checked.
///
/// # Errors
///
/// Returns [`ApiError::MalformedCertificateData`] with the text before the
/// first comma if the prefix does not match, or [`ApiError::Base64Decode`].
pub fn decode_data_uri(value: &str) -> Result<Vec<u8>, ApiError> {
    let Some(prefix) = DATA_URI_PREFIX.find(value) else {
        let head = value.split_once(',').map_or(value, |(head, _)| head);
        return Err(ApiError::MalformedCertificateData(head.to_string()));
    };

    Ok(STANDARD.decode(&value[prefix.end()..])?)
}

//! Test fixtures with sample data.
//!
//! XTAM response bodies, built the way the service sends them: the record
//! value is JSON text stored in the `custom` string of the outer document.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::{Value, json};

/// Session cookie handed out by the fake XTAM.
pub const SESSION_COOKIE: &str = "JSESSIONID=6F1C2B0D9E";

/// `Set-Cookie` header value establishing [`SESSION_COOKIE`].
pub const SESSION_SET_COOKIE: &str = "JSESSIONID=6F1C2B0D9E; Path=/; HttpOnly";

/// Service ticket returned by the fake CAS.
pub const SERVICE_TICKET: &str = "ST-abc";

/// Self-signed sample certificate, PEM encoded.
pub const SAMPLE_CERTIFICATE_PEM: &str = "-----BEGIN CERTIFICATE-----
MIIBszCCAVmgAwIBAgIUQ2xvdWR5IHNhbXBsZSBjZXJ0aWZpY2F0ZTAKBggqhkjO
PQQDAjAWMRQwEgYDVQQDDAt4dGFtLnNhbXBsZTAeFw0yNjAxMDEwMDAwMDBaFw0z
NjAxMDEwMDAwMDBaMBYxFDASBgNVBAMMC3h0YW0uc2FtcGxlMFkwEwYHKoZIzj0C
AQYIKoZIzj0DAQcDQgAE
-----END CERTIFICATE-----
";

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// Display name
    pub name: String,
    /// Record ID
    pub id: u64,
    /// Record type name
    pub record_type: String,
}

impl ListingEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: &str, id: u64, record_type: &str) -> Self {
        Self {
            name: name.to_string(),
            id,
            record_type: record_type.to_string(),
        }
    }

    /// Create a Secret entry.
    #[must_use]
    pub fn secret(name: &str, id: u64) -> Self {
        Self::new(name, id, "Secret")
    }

    /// Create a Certificate entry.
    #[must_use]
    pub fn certificate(name: &str, id: u64) -> Self {
        Self::new(name, id, "Certificate")
    }

    /// Entry as XTAM lists it.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "id": self.id,
            "recordType": { "name": self.record_type },
        })
    }
}

/// Folder listing body for `entries`.
#[must_use]
pub fn folder_listing(entries: &[ListingEntry]) -> Value {
    Value::Array(entries.iter().map(ListingEntry::to_json).collect())
}

/// Unlocked record body with an arbitrary nested document.
#[must_use]
pub fn unlocked_record(record_type: &str, custom: &Value) -> Value {
    json!({
        "custom": custom.to_string(),
        "recordType": { "name": record_type },
    })
}

/// Unlocked Secret record body.
#[must_use]
pub fn secret_record(value: &str) -> Value {
    unlocked_record("Secret", &json!({ "Secret": value }))
}

/// Unlocked Certificate record body carrying `data` verbatim.
#[must_use]
pub fn certificate_record(data: &str) -> Value {
    unlocked_record("Certificate", &json!({ "Cert": { "Data": data } }))
}

/// Base64 data URI of `payload` with the given media type.
#[must_use]
pub fn data_uri(media_type: &str, payload: &[u8]) -> String {
    format!("data:{media_type};base64,{}", STANDARD.encode(payload))
}

/// Unlocked Certificate record body for [`SAMPLE_CERTIFICATE_PEM`].
#[must_use]
pub fn sample_certificate_record() -> Value {
    certificate_record(&data_uri(
        "application/x-x509-ca-cert",
        SAMPLE_CERTIFICATE_PEM.as_bytes(),
    ))
}

/// A small folder with two secrets, one certificate and one record of
/// another type.
#[must_use]
pub fn sample_folder() -> Vec<ListingEntry> {
    vec![
        ListingEntry::secret("DB-Password", 101),
        ListingEntry::secret("api-token", 102),
        ListingEntry::certificate("Web-TLS", 201),
        ListingEntry::new("jump-host", 301, "SSH Key"),
    ]
}

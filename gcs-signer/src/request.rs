//! Signing request and result types

use chrono::{DateTime, Utc};
use google_cloud_storage::sign::URLStyle;
use serde::Serialize;

/// Default host that signed URLs point at
pub const DEFAULT_SIGNING_HOST: &str = "storage.googleapis.com";

/// A request for a signed `GET` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Bucket holding the object
    pub bucket: String,
    /// Object key inside the bucket
    pub object: String,
    /// Host that replaces the default signing host, e.g. a CDN in front of the bucket
    pub custom_host: Option<String>,
    /// Minutes from now until the URL expires
    pub timeout_minutes: i64,
}

impl SigningRequest {
    /// Creates a request that signs against the default host
    #[must_use]
    pub fn new(bucket: impl Into<String>, object: impl Into<String>, timeout_minutes: i64) -> Self {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            custom_host: None,
            timeout_minutes,
        }
    }

    /// Routes the URL through `host`. A blank host keeps the default one.
    #[must_use]
    pub fn with_custom_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into().trim().to_string();
        self.custom_host = (!host.is_empty()).then_some(host);
        self
    }

    /// Host the URL will carry
    #[must_use]
    pub fn signing_host(&self) -> &str {
        self.custom_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .unwrap_or(DEFAULT_SIGNING_HOST)
    }
}

/// Signed URL with issuance and expiration information
#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    /// The signed URL for GET operations
    pub url: String,
    /// UTC timestamp embedded as `X-Goog-Date`
    pub issued_at: DateTime<Utc>,
    /// UTC timestamp after which the URL stops working
    pub expires_at: DateTime<Utc>,
}

/// Path-style URL (`https://{host}/{bucket}/{object}`) on a chosen host.
///
/// The host is part of the V4 canonical request, so the signature covers the
/// host callers will actually hit while the path still names the real bucket.
pub struct HostStyle {
    host: String,
}

impl HostStyle {
    #[must_use]
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }
}

impl URLStyle for HostStyle {
    fn host(&self, _bucket: &str) -> String {
        self.host.clone()
    }

    fn path(&self, bucket: &str, object: &str) -> String {
        if object.is_empty() {
            return bucket.to_string();
        }
        format!("{bucket}/{object}")
    }
}

//! Error types for signer operations

use google_cloud_storage::client::google_cloud_auth;
use google_cloud_storage::sign::SignedURLError;
use thiserror::Error;

/// Result type for signer operations
pub type SignerResult<T> = Result<T, SignerError>;

/// Errors that can occur while building the signer or signing URLs
#[derive(Error, Debug)]
pub enum SignerError {
    /// Credentials are unreadable or malformed, or the storage client could not be initialized
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Client setup was cancelled or ran past its deadline
    #[error("Client setup aborted: {0}")]
    SetupAborted(String),

    /// The storage SDK refused or failed to sign the URL
    #[error("Signing error: {0}")]
    SigningError(#[from] SignedURLError),
}

/// Coarse classification of [`SignerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while constructing the signer
    Configuration,
    /// Raised while signing a URL
    Signing,
}

impl SignerError {
    /// Returns whether the error happened during construction or signing
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError(_) | Self::SetupAborted(_) => ErrorKind::Configuration,
            Self::SigningError(_) => ErrorKind::Signing,
        }
    }
}

impl From<google_cloud_auth::error::Error> for SignerError {
    fn from(error: google_cloud_auth::error::Error) -> Self {
        Self::ConfigError(error.to_string())
    }
}

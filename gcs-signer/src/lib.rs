//! Signed URL generation for Google Cloud Storage objects
//!
//! Builds a storage client from a service-account credentials file and hands
//! out time-limited `GET` URLs for objects, optionally on a custom host.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Storage client wrapper and signing trait
pub mod client;

mod error;
mod request;

/// Deployment configuration
pub mod types;

pub use client::{AuthMode, GcsSigner, SignerConfig, UrlSigner};
pub use error::{ErrorKind, SignerError, SignerResult};
pub use request::{SignedUrl, SigningRequest, DEFAULT_SIGNING_HOST};

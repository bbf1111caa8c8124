//! Google Cloud Storage signer client

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::sign::{RsaKeyPair, SignBy, SignedURLMethod, SignedURLOptions};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::request::HostStyle;
use crate::{SignedUrl, SignerError, SignerResult, SigningRequest};

/// Default deadline for building the storage client
pub const DEFAULT_SETUP_TIMEOUT_SECS: u64 = 30;

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// How the storage client authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Full OAuth setup against the storage API; fails fast when the token exchange fails
    #[default]
    Authenticated,
    /// Sign with the service-account private key only, without any network access
    KeyOnly,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "authenticated" => Ok(Self::Authenticated),
            "key-only" | "key_only" => Ok(Self::KeyOnly),
            other => Err(format!("Invalid auth mode: {other}")),
        }
    }
}

/// Settings used to construct a [`GcsSigner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    /// Path to the service-account JSON key
    pub credentials_file: PathBuf,
    /// Deadline for the whole construction, including the token exchange
    pub setup_timeout: Duration,
    /// Authentication mode of the underlying client
    pub auth_mode: AuthMode,
}

impl SignerConfig {
    /// Creates a config with the default deadline and authenticated mode
    #[must_use]
    pub fn new(credentials_file: impl Into<PathBuf>) -> Self {
        Self {
            credentials_file: credentials_file.into(),
            setup_timeout: Duration::from_secs(DEFAULT_SETUP_TIMEOUT_SECS),
            auth_mode: AuthMode::default(),
        }
    }

    /// Overrides the construction deadline
    #[must_use]
    pub const fn with_setup_timeout(mut self, setup_timeout: Duration) -> Self {
        self.setup_timeout = setup_timeout;
        self
    }

    /// Overrides the authentication mode
    #[must_use]
    pub const fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }
}

/// Produces time-limited signed URLs for objects
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Signs a `GET` URL for the requested object
    ///
    /// # Errors
    ///
    /// Returns `SignerError::SigningError` if the storage SDK rejects or fails the request
    async fn sign(&self, request: &SigningRequest) -> SignerResult<SignedUrl>;

    /// Signs a `GET` URL and returns only the URL string
    ///
    /// An empty or missing `custom_host` keeps the default signing host.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::SigningError` if the storage SDK rejects or fails the request
    async fn sign_url(
        &self,
        bucket: &str,
        object: &str,
        custom_host: Option<&str>,
        timeout_minutes: i64,
    ) -> SignerResult<String> {
        let mut request = SigningRequest::new(bucket, object, timeout_minutes);
        if let Some(host) = custom_host {
            request = request.with_custom_host(host);
        }
        Ok(self.sign(&request).await?.url)
    }
}

/// Signer backed by a Google Cloud Storage client
#[derive(Clone)]
pub struct GcsSigner {
    client: Client,
    google_access_id: String,
}

impl Debug for GcsSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsSigner")
            .field("google_access_id", &self.google_access_id)
            .finish_non_exhaustive()
    }
}

impl GcsSigner {
    /// Creates a signer from a service-account credentials file
    ///
    /// # Arguments
    ///
    /// * `credentials_file` - Path to the service-account JSON key
    /// * `cancel` - Aborts the setup when cancelled
    ///
    /// # Errors
    ///
    /// Returns `SignerError::ConfigError` if the credentials cannot be used or the client fails to initialize
    /// Returns `SignerError::SetupAborted` if `cancel` fires or the default deadline passes
    pub async fn new(
        credentials_file: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> SignerResult<Self> {
        Self::connect(&SignerConfig::new(credentials_file.as_ref()), cancel).await
    }

    /// Creates a signer from an explicit config
    ///
    /// # Errors
    ///
    /// Returns `SignerError::ConfigError` if the credentials cannot be used or the client fails to initialize
    /// Returns `SignerError::SetupAborted` if `cancel` fires or `config.setup_timeout` passes
    pub async fn connect(config: &SignerConfig, cancel: &CancellationToken) -> SignerResult<Self> {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                Err(SignerError::SetupAborted("setup cancelled".to_string()))
            }
            built = tokio::time::timeout(config.setup_timeout, Self::build(config)) => {
                built.unwrap_or_else(|_| {
                    Err(SignerError::SetupAborted(format!(
                        "setup exceeded deadline of {:?}",
                        config.setup_timeout
                    )))
                })
            }
        };

        match &result {
            Ok(signer) => info!(
                "Initialized GCS signer for {} using credentials {} ({:?})",
                signer.google_access_id,
                config.credentials_file.display(),
                config.auth_mode
            ),
            Err(e) => error!(
                "Failed to initialize GCS signer from {}: {}",
                config.credentials_file.display(),
                e
            ),
        }

        result
    }

    /// Service account email the URLs are signed as
    #[must_use]
    pub fn google_access_id(&self) -> &str {
        &self.google_access_id
    }

    async fn build(config: &SignerConfig) -> SignerResult<Self> {
        let credentials = load_credentials(&config.credentials_file).await?;
        let (google_access_id, private_key) = signing_identity(&credentials)?;

        let client_config = match config.auth_mode {
            AuthMode::Authenticated => ClientConfig::default().with_credentials(credentials).await?,
            AuthMode::KeyOnly => ClientConfig {
                default_google_access_id: Some(google_access_id.clone()),
                default_sign_by: Some(SignBy::PrivateKey(private_key)),
                project_id: credentials.project_id,
                ..ClientConfig::default().anonymous()
            },
        };

        Ok(Self {
            client: Client::new(client_config),
            google_access_id,
        })
    }
}

#[async_trait]
impl UrlSigner for GcsSigner {
    async fn sign(&self, request: &SigningRequest) -> SignerResult<SignedUrl> {
        // X-Goog-Date has second precision
        let issued_at = Utc::now().trunc_subsecs(0);
        // Non-positive timeouts become a zero expiry, which the SDK refuses
        let expires = Duration::from_secs(
            u64::try_from(request.timeout_minutes.saturating_mul(60)).unwrap_or_default(),
        );
        let host = request.signing_host();

        debug!(
            "Signing URL for object: {}/{} via {} expiring in {:?}",
            request.bucket, request.object, host, expires
        );

        let options = SignedURLOptions {
            method: SignedURLMethod::GET,
            start_time: Some(issued_at.into()),
            expires,
            style: Box::new(HostStyle::new(host)),
            ..Default::default()
        };

        let url = self
            .client
            .signed_url(&request.bucket, &request.object, None, None, options)
            .await
            .map_err(|e| {
                error!(
                    "Failed to sign URL for object: {}/{}: {}",
                    request.bucket, request.object, e
                );
                SignerError::from(e)
            })?;

        let expires_at = issued_at + expires;

        debug!(
            "Signed URL for object: {}/{} expires at: {}",
            request.bucket, request.object, expires_at
        );

        Ok(SignedUrl {
            url,
            issued_at,
            expires_at,
        })
    }
}

async fn load_credentials(path: &Path) -> SignerResult<CredentialsFile> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        SignerError::ConfigError(format!(
            "Failed to read credentials file {}: {e}",
            path.display()
        ))
    })?;

    CredentialsFile::new_from_str(&json).await.map_err(|e| {
        SignerError::ConfigError(format!(
            "Malformed credentials file {}: {e}",
            path.display()
        ))
    })
}

/// Extracts the account email and PEM private key, checking the key is usable for signing
fn signing_identity(credentials: &CredentialsFile) -> SignerResult<(String, Vec<u8>)> {
    if credentials.tp != SERVICE_ACCOUNT_TYPE {
        return Err(SignerError::ConfigError(format!(
            "Unsupported credentials type '{}', expected '{SERVICE_ACCOUNT_TYPE}'",
            credentials.tp
        )));
    }

    let google_access_id = credentials
        .client_email
        .clone()
        .filter(|email| !email.is_empty())
        .ok_or_else(|| SignerError::ConfigError("Credentials have no client_email".to_string()))?;

    let private_key = credentials
        .private_key
        .clone()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| SignerError::ConfigError("Credentials have no private_key".to_string()))?
        .into_bytes();

    RsaKeyPair::try_from(&private_key)
        .map_err(|e| SignerError::ConfigError(format!("Invalid private key: {e}")))?;

    Ok((google_access_id, private_key))
}

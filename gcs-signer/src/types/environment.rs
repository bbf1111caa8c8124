//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::Level;

use crate::client::{AuthMode, SignerConfig, DEFAULT_SETUP_TIMEOUT_SECS};

/// Default lifetime of a signed URL in minutes
pub const DEFAULT_SIGNED_URL_TIMEOUT_MINUTES: i64 = 15;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development {
        /// Optional override for signed URL lifetime in minutes
        timeout_override: Option<i64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let timeout_override = env::var("SIGNED_URL_TIMEOUT_MINUTES")
                    .ok()
                    .and_then(|val| val.parse::<i64>().ok());

                Self::Development { timeout_override }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the path of the service-account credentials file
    ///
    /// # Panics
    ///
    /// Panics if the `GCS_CREDENTIALS_FILE` environment variable is not set outside development
    #[must_use]
    pub fn credentials_file(&self) -> PathBuf {
        match self {
            Self::Production | Self::Staging => env::var("GCS_CREDENTIALS_FILE")
                .expect("GCS_CREDENTIALS_FILE environment variable is not set")
                .into(),
            Self::Development { .. } => env::var("GCS_CREDENTIALS_FILE")
                .unwrap_or_else(|_| "credentials.json".to_string())
                .into(),
        }
    }

    /// Custom host to serve signed URLs from, if any
    #[must_use]
    pub fn custom_host() -> Option<String> {
        env::var("GCS_CUSTOM_HOST")
            .ok()
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
    }

    /// Signed URL lifetime in minutes
    #[must_use]
    pub fn signed_url_timeout_minutes(&self) -> i64 {
        match self {
            Self::Production | Self::Staging => DEFAULT_SIGNED_URL_TIMEOUT_MINUTES,
            Self::Development { timeout_override } => {
                timeout_override.unwrap_or(DEFAULT_SIGNED_URL_TIMEOUT_MINUTES)
            }
        }
    }

    /// Deadline for building the storage client
    #[must_use]
    pub fn setup_timeout() -> Duration {
        let secs = env::var("GCS_SETUP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SETUP_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Authentication mode of the storage client
    ///
    /// # Panics
    ///
    /// Panics if `GCS_SIGNER_AUTH_MODE` contains an invalid value
    #[must_use]
    pub fn auth_mode() -> AuthMode {
        env::var("GCS_SIGNER_AUTH_MODE")
            .map(|val| {
                val.parse::<AuthMode>()
                    .unwrap_or_else(|e| panic!("{e}"))
            })
            .unwrap_or_default()
    }

    /// Signer configuration for the environment
    #[must_use]
    pub fn signer_config(&self) -> SignerConfig {
        SignerConfig::new(self.credentials_file())
            .with_setup_timeout(Self::setup_timeout())
            .with_auth_mode(Self::auth_mode())
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Default log level
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}

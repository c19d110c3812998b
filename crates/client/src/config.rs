//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPWIRE_AUTH_URL` - Auth service base URL (login, profile, addresses, users)
//! - `SHOPWIRE_PRODUCTS_URL` - Products service base URL
//! - `SHOPWIRE_CART_URL` - Cart service base URL
//! - `SHOPWIRE_WISHLIST_URL` - Wishlist service base URL
//! - `SHOPWIRE_ORDERS_URL` - Orders service base URL
//!
//! ## Optional
//! - `SHOPWIRE_DATA_DIR` - Directory holding the session snapshot (default: .shopwire)
//! - `SHOPWIRE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHOPWIRE_CATALOG_TTL_SECS` - How long a loaded catalog is trusted (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0 to 1.0 (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URLs of the remote services
    pub endpoints: ServiceEndpoints,
    /// Directory for the durable session snapshot
    pub data_dir: PathBuf,
    /// Timeout applied to every remote request
    pub request_timeout: Duration,
    /// Time-to-live of a loaded catalog snapshot
    pub catalog_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
}

/// Base URLs of the four remote services.
///
/// Cart and wishlist live on the same service but under different roots.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub auth: Url,
    pub products: Url,
    pub cart: Url,
    pub wishlist: Url,
    pub orders: Url,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default catalog time-to-live.
    pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoints = ServiceEndpoints::from_env()?;
        let data_dir = PathBuf::from(get_env_or_default("SHOPWIRE_DATA_DIR", ".shopwire"));
        let request_timeout = get_duration_secs(
            "SHOPWIRE_REQUEST_TIMEOUT_SECS",
            Self::DEFAULT_REQUEST_TIMEOUT,
        )?;
        let catalog_ttl = get_duration_secs("SHOPWIRE_CATALOG_TTL_SECS", Self::DEFAULT_CATALOG_TTL)?;

        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar("SENTRY_SAMPLE_RATE".to_string(), e.to_string()))?;
        if !(0.0..=1.0).contains(&sentry_sample_rate) {
            return Err(ConfigError::InvalidEnvVar(
                "SENTRY_SAMPLE_RATE".to_string(),
                format!("must be between 0.0 and 1.0 (got {sentry_sample_rate})"),
            ));
        }

        Ok(Self {
            endpoints,
            data_dir,
            request_timeout,
            catalog_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }

    /// Configuration pointing every service at the given endpoints, with defaults elsewhere.
    #[must_use]
    pub fn with_endpoints(endpoints: ServiceEndpoints, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            endpoints,
            data_dir: data_dir.into(),
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            catalog_ttl: Self::DEFAULT_CATALOG_TTL,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        }
    }

    /// Path of the durable session snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

impl ServiceEndpoints {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            auth: get_required_url("SHOPWIRE_AUTH_URL")?,
            products: get_required_url("SHOPWIRE_PRODUCTS_URL")?,
            cart: get_required_url("SHOPWIRE_CART_URL")?,
            wishlist: get_required_url("SHOPWIRE_WISHLIST_URL")?,
            orders: get_required_url("SHOPWIRE_ORDERS_URL")?,
        })
    }

    /// Endpoints for services mounted under one host, e.g. a test server.
    ///
    /// Uses `/api/auth`, `/api/products`, `/api/cart`, `/api/wishlist` and `/api/orders`.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if `base` is not an absolute URL.
    pub fn under(base: &str) -> Result<Self, url::ParseError> {
        let base = base.trim_end_matches('/');
        Ok(Self {
            auth: Url::parse(&format!("{base}/api/auth"))?,
            products: Url::parse(&format!("{base}/api/products"))?,
            cart: Url::parse(&format!("{base}/api/cart"))?,
            wishlist: Url::parse(&format!("{base}/api/wishlist"))?,
            orders: Url::parse(&format!("{base}/api/orders"))?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable and parse it as an absolute URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let value = get_required_env(key)?;
    parse_service_url(key, &value)
}

fn parse_service_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim_end_matches('/'))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a whole number of seconds as a `Duration`.
fn get_duration_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

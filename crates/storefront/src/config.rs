//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_API_URL` - Base URL of the product/stock API (e.g., http://localhost:3333)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_API_TOKEN` - Bearer token sent to the catalog API
//! - `CATALOG_CACHE_TTL_SECS` - Product metadata cache TTL, 0 disables (default: 300)
//! - `CART_STORAGE_PATH` - File holding persisted carts (default: data/cart.json)
//! - `CART_STORAGE_KEY` - Storage key for the cart (default: @RocketShoes:cart)
//! - `CART_LOCALE` - Notification language, `en` or `pt-BR` (default: pt-BR)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::notify::Locale;

/// Default storage key, shared with the browser storefront.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Catalog and stock API configuration
    pub catalog: CatalogConfig,
    /// Cart persistence and notification settings
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Catalog API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL; `products/{id}` and `stock/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// How long product metadata stays cached. Stock is never cached.
    pub cache_ttl: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

/// Cart persistence and notification settings.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// File backing the key-value storage
    pub storage_path: PathBuf,
    /// Key the serialized cart is stored under
    pub storage_key: String,
    /// Language for user-facing notifications
    pub locale: Locale,
}

impl StorefrontConfig {
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

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            catalog: CatalogConfig::from_env()?,
            cart: CartConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CatalogConfig {
    /// Load the catalog settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CATALOG_API_URL` is missing or not an
    /// absolute http(s) URL, or if the token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_catalog_url(&get_required_env("CATALOG_API_URL")?)?;
        let api_token = get_optional_env("CATALOG_API_TOKEN")
            .map(|token| validate_secret(token, "CATALOG_API_TOKEN"))
            .transpose()?;
        let cache_ttl = get_env_or_default("CATALOG_CACHE_TTL_SECS", "300")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CATALOG_CACHE_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            api_token,
            cache_ttl,
        })
    }

    /// Bearer token, if one is configured.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.api_token.as_ref().map(|token| token.expose_secret())
    }
}

impl CartConfig {
    /// Load the cart settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CART_LOCALE` is not a supported locale or
    /// `CART_STORAGE_KEY` is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_key = get_env_or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let locale = get_env_or_default("CART_LOCALE", "pt-BR")
            .parse::<Locale>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_LOCALE".to_string(), e.to_string()))?;

        Ok(Self {
            storage_path: PathBuf::from(get_env_or_default(
                "CART_STORAGE_PATH",
                "data/cart.json",
            )),
            storage_key,
            locale,
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

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and check the catalog base URL.
fn parse_catalog_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("CATALOG_API_URL".to_string(), msg);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("must be an absolute URL with a host".to_string()));
    }
    Ok(url)
}

/// Reject obvious placeholder values before wrapping a secret.
fn validate_secret(value: String, var_name: &str) -> Result<SecretString, ConfigError> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog_config(token: Option<&str>) -> CatalogConfig {
        CatalogConfig {
            base_url: Url::parse("http://localhost:3333").unwrap(),
            api_token: token.map(|t| SecretString::from(t.to_string())),
            cache_ttl: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_parse_catalog_url_valid() {
        let url = parse_catalog_url("http://localhost:3333").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(3333));
    }

    #[test]
    fn test_parse_catalog_url_rejects_other_schemes() {
        let err = parse_catalog_url("ftp://catalog.local").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_catalog_url_rejects_garbage() {
        assert!(parse_catalog_url("not a url").is_err());
        assert!(parse_catalog_url("mailto:shop@example.com").is_err());
    }

    #[test]
    fn test_validate_secret_placeholder() {
        let result = validate_secret("your-api-token".to_string(), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_valid() {
        assert!(validate_secret("aB3xY9mK2nL5pQ7r".to_string(), "TEST_VAR").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            catalog: catalog_config(None),
            cart: CartConfig {
                storage_path: PathBuf::from("data/cart.json"),
                storage_key: DEFAULT_STORAGE_KEY.to_string(),
                locale: Locale::PtBr,
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_catalog_config_debug_redacts_token() {
        let config = catalog_config(Some("super_secret_catalog_token"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("localhost:3333"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_catalog_token"));
        assert_eq!(config.bearer_token(), Some("super_secret_catalog_token"));
    }
}

//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `HIFIY_HOST` - Bind address (default: 127.0.0.1)
//! - `HIFIY_PORT` - Listen port (default: 8080)
//! - `HIFIY_BASE_URL` - Public URL used in pagination links
//!   (default: `http://localhost:8080`)
//! - `CACHE_CAPACITY` - Maximum cached responses (default: 1000)
//! - `CACHE_PRODUCTS_TTL_SECS` - Product listing TTL (default: 900)
//! - `CACHE_FAVORITES_TTL_SECS` - Favorites listing TTL (default: 900)
//! - `CACHE_USERS_TTL_SECS` - Admin user listing TTL (default: 600)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used for pagination next/prev links
    pub base_url: String,
    /// Response cache tuning
    pub cache: CacheConfig,
}

/// Response cache configuration.
///
/// TTLs are per view: long-lived public listings, a shorter window for the
/// admin-sensitive user listing.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: u64,
    pub products_ttl: Duration,
    pub favorites_ttl: Duration,
    pub users_ttl: Duration,
}

impl ApiConfig {
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

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = parse_env_or("HIFIY_HOST", "127.0.0.1")?;
        let port = parse_env_or("HIFIY_PORT", "8080")?;
        let base_url = get_env_or_default("HIFIY_BASE_URL", "http://localhost:8080");

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_owned(),
            cache: CacheConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            capacity: parse_env_or("CACHE_CAPACITY", "1000")?,
            products_ttl: ttl_env_or("CACHE_PRODUCTS_TTL_SECS", "900")?,
            favorites_ttl: ttl_env_or("CACHE_FAVORITES_TTL_SECS", "900")?,
            users_ttl: ttl_env_or("CACHE_USERS_TTL_SECS", "600")?,
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

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
fn parse_env_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a TTL in whole seconds.
fn ttl_env_or(key: &str, default: &str) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(parse_env_or(key, default)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutation is unsafe under edition 2024, so defaults are
    // exercised through the parse helpers instead of the process env.

    #[test]
    fn test_parse_defaults() {
        let host: IpAddr = parse_env_or("HIFIY_TEST_UNSET_HOST", "127.0.0.1").unwrap();
        assert_eq!(host, IpAddr::from([127, 0, 0, 1]));

        let port: u16 = parse_env_or("HIFIY_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);

        let ttl = ttl_env_or("HIFIY_TEST_UNSET_TTL", "900").unwrap();
        assert_eq!(ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_invalid_default_is_reported() {
        let result: Result<u16, _> = parse_env_or("HIFIY_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}

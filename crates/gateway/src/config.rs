//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Bearer token verification secret (must match the user
//!   service's signing secret)
//!
//! ## Optional
//! - `GATEWAY_HOST` - Bind address (default: 127.0.0.1)
//! - `GATEWAY_PORT` - Listen port (default: 3000)
//! - `USER_SERVICE_URL` - default `http://localhost:3001`
//! - `PRODUCT_SERVICE_URL` - default `http://localhost:3002`
//! - `CART_SERVICE_URL` - default `http://localhost:3003`
//! - `ORDER_SERVICE_URL` - default `http://localhost:3004`

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
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

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token verification secret
    pub jwt_secret: SecretString,
    /// Downstream service base URLs
    pub services: ServiceMap,
}

/// Base URLs of the proxied services.
#[derive(Debug, Clone)]
pub struct ServiceMap {
    pub users: String,
    pub products: String,
    pub cart: String,
    pub orders: String,
}

impl ServiceMap {
    /// Service names, as reported by the health endpoint.
    #[must_use]
    pub const fn names() -> [&'static str; 4] {
        ["users", "products", "cart", "orders"]
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any
    /// service URL fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("GATEWAY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("GATEWAY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_PORT".to_owned(), e.to_string()))?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar("JWT_SECRET".to_owned()))?;

        let services = ServiceMap {
            users: get_service_url("USER_SERVICE_URL", "http://localhost:3001")?,
            products: get_service_url("PRODUCT_SERVICE_URL", "http://localhost:3002")?,
            cart: get_service_url("CART_SERVICE_URL", "http://localhost:3003")?,
            orders: get_service_url("ORDER_SERVICE_URL", "http://localhost:3004")?,
        };

        Ok(Self {
            host,
            port,
            jwt_secret,
            services,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read a service URL, validating that it parses, and strip any trailing
/// slash so paths can be appended directly.
fn get_service_url(key: &str, default: &str) -> Result<String, ConfigError> {
    let raw = get_env_or_default(key, default);
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))?;
    Ok(raw.trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url_strips_trailing_slash() {
        let url = get_service_url("BEPVIET_TEST_UNSET_URL", "http://localhost:3001/").unwrap();
        assert_eq!(url, "http://localhost:3001");
    }

    #[test]
    fn test_service_url_rejects_garbage_default() {
        assert!(get_service_url("BEPVIET_TEST_UNSET_URL", "not a url").is_err());
    }
}

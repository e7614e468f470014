//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Bearer token signing secret (min 32 chars)
//!
//! ## Optional
//! - `SERVICES_HOST` - Bind address (default: 127.0.0.1)
//! - `USER_SERVICE_PORT` - User directory port (default: 3001)
//! - `PRODUCT_SERVICE_PORT` - Product catalog port (default: 3002)
//! - `CART_SERVICE_PORT` - Cart store port (default: 3003)
//! - `ORDER_SERVICE_PORT` - Order store port (default: 3004)
//! - `CART_TTL_SECS` - Cart entry expiry window (default: 3600)
//! - `PRODUCT_SERVICE_URL` - When set, the order service resolves prices over
//!   HTTP instead of the in-process catalog (split deployment)
//! - `INVENTORY_POLICY` - `none` | `on-create` | `on-fulfillment`
//!   (default: none)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;

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

/// When the order flow decrements catalog inventory.
///
/// The schema carries inventory counts but the ordering path historically
/// never touched them, so `None` is the default; the other two settings make
/// the choice explicit instead of implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InventoryPolicy {
    /// Never decrement from the ordering flow.
    #[default]
    None,
    /// Decrement when an order is created.
    OnCreate,
    /// Decrement when an order transitions pending -> completed.
    OnFulfillment,
}

impl std::str::FromStr for InventoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "on-create" => Ok(Self::OnCreate),
            "on-fulfillment" => Ok(Self::OnFulfillment),
            other => Err(format!("invalid inventory policy: {other}")),
        }
    }
}

/// Backend services configuration.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    /// IP address to bind the servers to
    pub host: IpAddr,
    /// User directory port
    pub user_port: u16,
    /// Product catalog port
    pub product_port: u16,
    /// Cart store port
    pub cart_port: u16,
    /// Order store port
    pub order_port: u16,
    /// Bearer token signing secret
    pub jwt_secret: SecretString,
    /// Cart entry expiry window
    pub cart_ttl: Duration,
    /// Remote catalog base URL for a split deployment; `None` keeps price
    /// lookups in-process
    pub catalog_url: Option<String>,
    /// When the ordering flow decrements inventory
    pub inventory_policy: InventoryPolicy,
}

impl ServicesConfig {
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

        let host = get_env_or_default("SERVICES_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVICES_HOST".to_owned(), e.to_string()))?;

        let jwt_secret = get_required_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let cart_ttl_secs = parse_env_or_default::<u64>("CART_TTL_SECS", 3600)?;
        let inventory_policy = get_env_or_default("INVENTORY_POLICY", "none")
            .parse::<InventoryPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("INVENTORY_POLICY".to_owned(), e))?;

        Ok(Self {
            host,
            user_port: parse_env_or_default("USER_SERVICE_PORT", 3001)?,
            product_port: parse_env_or_default("PRODUCT_SERVICE_PORT", 3002)?,
            cart_port: parse_env_or_default("CART_SERVICE_PORT", 3003)?,
            order_port: parse_env_or_default("ORDER_SERVICE_PORT", 3004)?,
            jwt_secret,
            cart_ttl: Duration::from_secs(cart_ttl_secs),
            catalog_url: get_optional_env("PRODUCT_SERVICE_URL"),
            inventory_policy,
        })
    }

    /// Socket address for the user directory.
    #[must_use]
    pub const fn user_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.user_port)
    }

    /// Socket address for the product catalog.
    #[must_use]
    pub const fn product_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.product_port)
    }

    /// Socket address for the cart store.
    #[must_use]
    pub const fn cart_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.cart_port)
    }

    /// Socket address for the order store.
    #[must_use]
    pub const fn order_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.order_port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

impl Default for ServicesConfig {
    /// Localhost defaults with ephemeral ports; used by tests and the
    /// integration harness. Production loads [`ServicesConfig::from_env`].
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            user_port: 0,
            product_port: 0,
            cart_port: 0,
            order_port: 0,
            jwt_secret: SecretString::from("kP9!fQ2@xL7#mR4$wT8%vB3^nJ6&hD1*"),
            cart_ttl: Duration::from_secs(3600),
            catalog_url: None,
            inventory_policy: InventoryPolicy::None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_secret_length(&secret, "TEST").is_err());
    }

    #[test]
    fn test_validate_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_secret_length(&secret, "TEST").is_ok());
    }

    #[test]
    fn test_inventory_policy_parse() {
        assert_eq!(
            "on-create".parse::<InventoryPolicy>().unwrap(),
            InventoryPolicy::OnCreate
        );
        assert!("sometimes".parse::<InventoryPolicy>().is_err());
    }

    #[test]
    fn test_socket_addrs() {
        let config = ServicesConfig::default();
        assert_eq!(config.user_addr().ip().to_string(), "127.0.0.1");
    }
}

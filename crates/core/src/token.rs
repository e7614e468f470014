//! Bearer token claims and helpers.
//!
//! Tokens are HS256 JWTs carrying the account id, phone, and role, valid for
//! 24 hours. The user service issues them at registration/login; the gateway
//! verifies them and forwards the identity as headers.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::types::{AccountRole, Phone, UserId};

/// Token validity window.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Errors from issuing or verifying a token.
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    /// The token is malformed, has a bad signature, or is expired.
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Claims embedded in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: UserId,
    /// Account phone number.
    pub phone: Phone,
    /// Account role.
    pub role: AccountRole,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// Build claims for an account, expiring [`TOKEN_TTL_HOURS`] from now.
    #[must_use]
    pub fn new(sub: UserId, phone: Phone, role: AccountRole) -> Self {
        let now = Utc::now();
        Self {
            sub,
            phone,
            role,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

/// Sign claims into a compact JWT.
///
/// # Errors
///
/// Returns `TokenError::Invalid` if encoding fails.
pub fn issue(claims: &Claims, secret: &SecretString) -> Result<String, TokenError> {
    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    Ok(jsonwebtoken::encode(&Header::default(), claims, &key)?)
}

/// Verify a compact JWT and return its claims.
///
/// # Errors
///
/// Returns `TokenError::Invalid` on a bad signature, malformed token, or
/// expired `exp`.
pub fn verify(token: &str, secret: &SecretString) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let data = jsonwebtoken::decode::<Claims>(token, &key, &Validation::default())?;
    Ok(data.claims)
}

//! User directory and credential checks.
//!
//! Accounts are keyed by phone number. Passwords are hashed with Argon2id;
//! the hash never leaves this module.

pub mod routes;

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use bepviet_core::{AccountRole, AccountStatus, Phone, UserId};

use crate::error::{ApiError, Result};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;
/// Minimum full-name length.
const MIN_FULLNAME_LENGTH: usize = 3;

/// An account record. Internal to the directory; responses use [`UserView`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub phone: Phone,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    password_hash: String,
}

/// The wire representation of an account (no credential material).
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub phone: Phone,
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub email: String,
    pub address: String,
    #[serde(rename = "userType")]
    pub role: AccountRole,
    pub status: AccountStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            phone: user.phone.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Fields accepted at registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub phone: Phone,
    pub password: String,
    pub email: String,
    pub address: String,
}

/// Admin listing filter.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub status: Option<AccountStatus>,
    /// Case-insensitive substring over full name and phone.
    pub search: Option<String>,
}

/// In-process account repository.
#[derive(Clone)]
pub struct UserDirectory {
    inner: Arc<RwLock<HashMap<Phone, User>>>,
}

impl UserDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a customer account.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a short name or password and `Conflict`
    /// when the phone is already registered.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        if registration.full_name.chars().count() < MIN_FULLNAME_LENGTH {
            return Err(ApiError::Validation(format!(
                "fullname must be at least {MIN_FULLNAME_LENGTH} characters"
            )));
        }
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;
        let user = User {
            id: UserId::generate(),
            phone: registration.phone.clone(),
            full_name: registration.full_name,
            email: registration.email,
            address: registration.address,
            role: AccountRole::Customer,
            status: AccountStatus::Active,
            created_at: Utc::now(),
            password_hash,
        };

        let mut users = self.inner.write().await;
        if users.contains_key(&registration.phone) {
            return Err(ApiError::Conflict("User already exists".to_owned()));
        }
        users.insert(registration.phone, user.clone());
        Ok(user)
    }

    /// Check credentials and return the account.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an unknown phone or wrong password and
    /// `Forbidden` for a blocked account. The unknown-phone and
    /// wrong-password cases are indistinguishable on the wire.
    pub async fn login(&self, phone: &Phone, password: &str) -> Result<User> {
        let users = self.inner.read().await;
        let user = users
            .get(phone)
            .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_owned()))?;

        if user.status == AccountStatus::Blocked {
            return Err(ApiError::Forbidden("Account is blocked".to_owned()));
        }

        verify_password(password, &user.password_hash)?;
        Ok(user.clone())
    }

    /// Look up an account by phone.
    pub async fn get(&self, phone: &Phone) -> Option<User> {
        self.inner.read().await.get(phone).cloned()
    }

    /// Update the profile fields a customer may edit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown phone.
    pub async fn update_profile(
        &self,
        phone: &Phone,
        full_name: Option<String>,
        email: Option<String>,
        address: Option<String>,
    ) -> Result<User> {
        let mut users = self.inner.write().await;
        let user = users
            .get_mut(phone)
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

        if let Some(full_name) = full_name {
            if full_name.chars().count() < MIN_FULLNAME_LENGTH {
                return Err(ApiError::Validation(format!(
                    "fullname must be at least {MIN_FULLNAME_LENGTH} characters"
                )));
            }
            user.full_name = full_name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(address) = address {
            user.address = address;
        }

        Ok(user.clone())
    }

    /// Customer accounts matching the filter, newest first.
    pub async fn list_customers(&self, filter: &UserFilter) -> Vec<User> {
        let users = self.inner.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);

        let mut matched: Vec<User> = users
            .values()
            .filter(|u| u.role == AccountRole::Customer)
            .filter(|u| filter.status.is_none_or(|s| u.status == s))
            .filter(|u| {
                needle.as_deref().is_none_or(|n| {
                    u.full_name.to_lowercase().contains(n) || u.phone.as_str().contains(n)
                })
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }

    /// Block or unblock an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown phone.
    pub async fn set_status(&self, phone: &Phone, status: AccountStatus) -> Result<User> {
        let mut users = self.inner.write().await;
        let user = users
            .get_mut(phone)
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;
        user.status = status;
        Ok(user.clone())
    }

    /// Promote an account to admin. Used by deployment seeding, not exposed
    /// over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown phone.
    pub async fn promote_to_admin(&self, phone: &Phone) -> Result<User> {
        let mut users = self.inner.write().await;
        let user = users
            .get_mut(phone)
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;
        user.role = AccountRole::Admin;
        Ok(user.clone())
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::Internal("password hashing failed".to_owned()))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_owned()))?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_owned()))
}

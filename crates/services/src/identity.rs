//! Caller identity extractors.
//!
//! Two trust models coexist, mirroring the route split at the gateway:
//!
//! - Cart and order routes sit behind gateway authentication; the gateway
//!   forwards the verified identity as `x-user-id`, `x-user-phone`, and
//!   `x-user-type` headers, which [`Identity`] reads back.
//! - User routes pass through the gateway unauthenticated, so the user
//!   service verifies the bearer token itself via [`BearerIdentity`] (it
//!   holds the signing secret anyway, being the issuer).

use axum::{extract::FromRequestParts, http::request::Parts};

use bepviet_core::{AccountRole, Phone, UserId, token};

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for the gateway-forwarded caller identity.
///
/// Rejects with 401 when the phone header is missing or malformed.
///
/// # Example
///
/// ```rust,ignore
/// async fn create_order(
///     identity: Identity,
///     ...
/// ) -> Result<impl IntoResponse> {
///     let customer = identity.phone;
///     ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    /// Account id, when the gateway forwarded one.
    pub user_id: Option<UserId>,
    /// Verified account phone.
    pub phone: Phone,
    /// Verified account role.
    pub role: AccountRole,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let phone = headers
            .get("x-user-phone")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("User authentication required".to_owned()))?;
        let phone = Phone::parse(phone)
            .map_err(|_| ApiError::Unauthorized("User authentication required".to_owned()))?;

        let user_id = headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<UserId>().ok());

        let role = headers
            .get("x-user-type")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok())
            .and_then(|code| AccountRole::try_from(code).ok())
            .unwrap_or(AccountRole::Customer);

        Ok(Self {
            user_id,
            phone,
            role,
        })
    }
}

/// Extractor that additionally requires the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if identity.role != AccountRole::Admin {
            return Err(ApiError::Forbidden("Admin access required".to_owned()));
        }
        Ok(Self(identity))
    }
}

/// Extractor for a caller verified directly from its bearer token.
///
/// Rejects with 401 when no token is presented and 403 when the token fails
/// verification.
#[derive(Debug, Clone)]
pub struct BearerIdentity {
    pub user_id: UserId,
    pub phone: Phone,
    pub role: AccountRole,
}

impl FromRequestParts<AppState> for BearerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_owned()))?;

        let claims = token::verify(token, &state.config().jwt_secret)
            .map_err(|_| ApiError::Forbidden("Invalid token".to_owned()))?;

        Ok(Self {
            user_id: claims.sub,
            phone: claims.phone,
            role: claims.role,
        })
    }
}

/// Bearer-verified caller that must hold the admin role.
#[derive(Debug, Clone)]
pub struct RequireBearerAdmin(pub BearerIdentity);

impl FromRequestParts<AppState> for RequireBearerAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = BearerIdentity::from_request_parts(parts, state).await?;
        if identity.role != AccountRole::Admin {
            return Err(ApiError::Forbidden("Admin access required".to_owned()));
        }
        Ok(Self(identity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Identity, ApiError> {
        let (mut parts, ()) = req.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_identity_from_headers() {
        let req = Request::builder()
            .header("x-user-phone", "0912345678")
            .header("x-user-type", "1")
            .body(())
            .unwrap();

        let identity = extract(req).await.unwrap();
        assert_eq!(identity.phone.as_str(), "0912345678");
        assert_eq!(identity.role, AccountRole::Admin);
    }

    #[tokio::test]
    async fn test_identity_missing_phone_rejected() {
        let req = Request::builder().body(()).unwrap();
        let err = extract(req).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_identity_defaults_to_customer() {
        let req = Request::builder()
            .header("x-user-phone", "0912345678")
            .body(())
            .unwrap();

        let identity = extract(req).await.unwrap();
        assert_eq!(identity.role, AccountRole::Customer);
    }

    #[tokio::test]
    async fn test_require_admin_rejects_customer() {
        let req = Request::builder()
            .header("x-user-phone", "0912345678")
            .header("x-user-type", "0")
            .body(())
            .unwrap();

        let (mut parts, ()) = req.into_parts();
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}

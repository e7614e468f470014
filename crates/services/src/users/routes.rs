//! User directory route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use bepviet_core::{AccountStatus, Phone, token};

use super::{Registration, UserFilter, UserView};
use crate::error::{ApiError, Result};
use crate::identity::{BearerIdentity, RequireBearerAdmin};
use crate::pagination::{DEFAULT_LIMIT, paginate};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub phone: String,
    pub password: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

/// Profile update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Admin listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Integer status code; `"2"` (or absent) disables the filter.
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Status update request body. The code is validated in the handler so an
/// out-of-range value reports the taxonomy's 400, not a decode rejection.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: u8,
}

/// Create the user directory router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/profile", get(profile).put(update_profile))
        .route("/api/users", get(list_users))
        .route("/api/users/{phone}/status", put(update_status))
}

async fn health() -> &'static str {
    "ok"
}

fn parse_phone(raw: &str) -> Result<Phone> {
    Phone::parse(raw).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Issue a bearer token for an account.
fn issue_token(state: &AppState, user: &super::User) -> Result<String> {
    let claims = token::Claims::new(user.id, user.phone.clone(), user.role);
    token::issue(&claims, &state.config().jwt_secret)
        .map_err(|e| ApiError::Internal(format!("token issuance failed: {e}")))
}

/// Register a new customer account.
#[instrument(skip(state, body))]
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let phone = parse_phone(&body.phone)?;
    let user = state
        .users()
        .register(Registration {
            full_name: body.fullname,
            phone,
            password: body.password,
            email: body.email.unwrap_or_default(),
            address: body.address.unwrap_or_default(),
        })
        .await?;

    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": UserView::from(&user),
            "token": token,
        })),
    ))
}

/// Log in with phone and password.
#[instrument(skip(state, body))]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let phone = parse_phone(&body.phone)?;
    let user = state.users().login(&phone, &body.password).await?;
    let token = issue_token(&state, &user)?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": UserView::from(&user),
        "token": token,
    })))
}

/// Get the caller's profile.
///
/// User routes pass through the gateway unauthenticated, so the token is
/// verified here.
#[instrument(skip(state, identity))]
async fn profile(
    State(state): State<AppState>,
    identity: BearerIdentity,
) -> Result<impl IntoResponse> {
    let user = state
        .users()
        .get(&identity.phone)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

    Ok(Json(json!({ "user": UserView::from(&user) })))
}

/// Update the caller's profile.
#[instrument(skip(state, identity, body))]
async fn update_profile(
    State(state): State<AppState>,
    identity: BearerIdentity,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .users()
        .update_profile(&identity.phone, body.fullname, body.email, body.address)
        .await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserView::from(&user),
    })))
}

/// List customer accounts (admin only).
#[instrument(skip(state, _admin))]
async fn list_users(
    State(state): State<AppState>,
    _admin: RequireBearerAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let status = match query.status.as_deref() {
        None | Some("2") => None,
        Some(raw) => {
            let code: u8 = raw
                .parse()
                .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?;
            Some(
                AccountStatus::try_from(code)
                    .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?,
            )
        }
    };

    let users = state
        .users()
        .list_customers(&UserFilter {
            status,
            search: query.search,
        })
        .await;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();

    let (page, pagination) = paginate(
        &views,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    );

    Ok(Json(json!({
        "users": page,
        "pagination": pagination,
    })))
}

/// Block or unblock an account (admin only).
#[instrument(skip(state, _admin))]
async fn update_status(
    State(state): State<AppState>,
    _admin: RequireBearerAdmin,
    Path(phone): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<impl IntoResponse> {
    let phone = parse_phone(&phone)?;
    let status = AccountStatus::try_from(body.status)
        .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?;
    let user = state.users().set_status(&phone, status).await?;

    Ok(Json(json!({
        "message": "User status updated successfully",
        "user": UserView::from(&user),
    })))
}

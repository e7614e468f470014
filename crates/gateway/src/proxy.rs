//! Reverse proxy: authentication, identity forwarding, and routing.
//!
//! `/api/users` and `/api/products` pass through unauthenticated; `/api/cart`
//! and `/api/orders` require a valid bearer token, whose claims are forwarded
//! to the backend as `x-user-id`, `x-user-phone`, and `x-user-type` headers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::instrument;

use bepviet_core::token;

use crate::config::{GatewayConfig, ServiceMap};

/// Maximum request body size forwarded downstream.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Timeout for proxied requests.
const PROXY_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway state shared across handlers.
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayStateInner>,
}

struct GatewayStateInner {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl GatewayState {
    /// Create the gateway state with its outbound HTTP client.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROXY_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(GatewayStateInner { config, http }),
        }
    }

    fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }
}

/// Gateway-level errors, rendered as JSON error bodies.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Route not found")]
    RouteNotFound,
    #[error("Request body too large or unreadable")]
    BadBody,
    #[error("Service temporarily unavailable")]
    Upstream,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::InvalidToken => StatusCode::FORBIDDEN,
            Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::BadBody => StatusCode::BAD_REQUEST,
            Self::Upstream => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Create the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(proxy)
        .with_state(state)
}

/// Health check reporting the service map.
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "services": ServiceMap::names(),
    }))
}

/// Resolve a request path to a downstream base URL and whether the route
/// requires authentication.
fn resolve_route<'a>(services: &'a ServiceMap, path: &str) -> Option<(&'a str, bool)> {
    let matches = |prefix: &str| path == prefix || path.starts_with(&format!("{prefix}/"));

    if matches("/api/users") {
        Some((&services.users, false))
    } else if matches("/api/products") {
        Some((&services.products, false))
    } else if matches("/api/cart") {
        Some((&services.cart, true))
    } else if matches("/api/orders") {
        Some((&services.orders, true))
    } else {
        None
    }
}

/// Extract and verify the bearer token, returning its claims.
fn authenticate(
    headers: &HeaderMap,
    config: &GatewayConfig,
) -> Result<token::Claims, GatewayError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(GatewayError::MissingToken)?;

    token::verify(token, &config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "token verification failed");
        GatewayError::InvalidToken
    })
}

/// Proxy a request to its downstream service.
#[instrument(skip(state, req), fields(path = %req.uri().path()))]
async fn proxy(State(state): State<GatewayState>, req: Request) -> Response {
    match forward(&state, req).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn forward(state: &GatewayState, req: Request) -> Result<Response, GatewayError> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_owned();

    let (base, protected) =
        resolve_route(&state.config().services, &path).ok_or(GatewayError::RouteNotFound)?;

    // Authenticate before touching the body
    let claims = if protected {
        Some(authenticate(&parts.headers, state.config())?)
    } else {
        None
    };

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| GatewayError::BadBody)?;

    let target = match parts.uri.query() {
        Some(query) => format!("{base}{path}?{query}"),
        None => format!("{base}{path}"),
    };

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|_| GatewayError::RouteNotFound)?;

    let mut outbound = state.inner.http.request(method, &target).body(body.to_vec());

    if let Some(content_type) = parts.headers.get("content-type").and_then(|v| v.to_str().ok()) {
        outbound = outbound.header("content-type", content_type);
    }

    // Forward user information to downstream services
    if let Some(claims) = &claims {
        outbound = outbound
            .header("x-user-id", claims.sub.to_string())
            .header("x-user-phone", claims.phone.as_str())
            .header("x-user-type", u8::from(claims.role).to_string());
    }

    let upstream = outbound.send().await.map_err(|e| {
        tracing::error!(target = %target, error = %e, "proxy request failed");
        GatewayError::Upstream
    })?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::error!(target = %target, error = %e, "proxy response read failed");
        GatewayError::Upstream
    })?;

    let mut response = Response::builder().status(status);
    if let Some(content_type) = content_type {
        response = response.header("content-type", content_type);
    }
    response
        .body(Body::from(bytes))
        .map_err(|_| GatewayError::Upstream)
}

//! Cart route handlers.
//!
//! The cart is addressed purely by the `userId` path segment; there is no
//! ownership check against the authenticated caller, so any caller holding a
//! valid token can read or mutate any user's cart. Callers are expected to
//! fall back to a local cache when this tier is unreachable.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use bepviet_core::{CartItem, ProductId};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub id: ProductId,
    /// Signed so that a non-positive quantity can be rejected with 400
    /// instead of a deserialization error.
    pub soluong: i64,
    pub note: Option<String>,
}

/// Update-cart-item request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub soluong: i64,
    pub note: Option<String>,
}

/// Create the cart service router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/cart/{user_id}", get(get_cart).delete(clear_cart))
        .route("/api/cart/{user_id}/items", post(add_item))
        .route(
            "/api/cart/{user_id}/items/{item_id}",
            put(update_item).delete(remove_item),
        )
}

async fn health() -> &'static str {
    "ok"
}

/// Get cart for user.
#[instrument(skip(state))]
async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let cart = state.carts().get(&user_id).await;
    Json(json!({ "cart": cart }))
}

/// Add item to cart, merging with any existing line for the same product.
#[instrument(skip(state, body))]
async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<AddItemRequest>,
) -> Result<impl IntoResponse> {
    let quantity = u32::try_from(body.soluong)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or_else(|| ApiError::Validation("Valid quantity required".to_owned()))?;

    let item = CartItem::new(body.id, quantity, body.note);
    let cart = state.carts().add_item(&user_id, item).await?;

    Ok(Json(json!({
        "message": "Item added to cart successfully",
        "cart": cart,
    })))
}

/// Set a line's absolute quantity; zero removes the line.
#[instrument(skip(state, body))]
async fn update_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, i64)>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse> {
    let quantity = u32::try_from(body.soluong.max(0))
        .map_err(|_| ApiError::Validation("Valid quantity required".to_owned()))?;

    let cart = state
        .carts()
        .update_item(&user_id, ProductId::new(item_id), quantity, body.note)
        .await?;

    Ok(Json(json!({
        "message": "Cart item updated successfully",
        "cart": cart,
    })))
}

/// Remove item from cart.
#[instrument(skip(state))]
async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, i64)>,
) -> impl IntoResponse {
    let cart = state
        .carts()
        .remove_item(&user_id, ProductId::new(item_id))
        .await;

    Json(json!({
        "message": "Item removed from cart successfully",
        "cart": cart,
    }))
}

/// Clear cart.
#[instrument(skip(state))]
async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    state.carts().clear(&user_id).await;
    Json(json!({ "message": "Cart cleared successfully" }))
}

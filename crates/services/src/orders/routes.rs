//! Order route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use bepviet_core::{
    DeliveryMethod, FALLBACK_UNIT_PRICE, OrderId, OrderItem, OrderStatus, Phone, Price, ProductId,
};

use super::{NewOrder, OrderFilter, compute_total};
use crate::config::InventoryPolicy;
use crate::error::{ApiError, Result};
use crate::identity::{Identity, RequireAdmin};
use crate::pagination::{DEFAULT_LIMIT, paginate};
use crate::state::AppState;

/// Address recorded for pickup orders when the caller sends none.
const PICKUP_ADDRESS: &str = "Lấy tại cửa hàng";

/// A line as submitted by the caller.
#[derive(Debug, Deserialize)]
pub struct IncomingItem {
    pub id: ProductId,
    pub soluong: i64,
    pub note: Option<String>,
    /// Captured unit price. When present it is used as-is, skipping the
    /// catalog lookup; the order *total* is still recomputed server-side.
    pub price: Option<Price>,
}

/// Create-order request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub hinhthucgiao: DeliveryMethod,
    pub ngaygiaohang: NaiveDate,
    pub thoigiangiao: Option<String>,
    pub ghichu: Option<String>,
    pub tenguoinhan: String,
    pub sdtnhan: String,
    pub diachinhan: Option<String>,
    pub items: Vec<IncomingItem>,
    /// Client-computed total; only checked against the server's own
    /// computation, never trusted.
    pub tongtien: Option<Price>,
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Integer status code; `"2"` (or absent) disables the filter.
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Customer history query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Status update request body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: u8,
}

/// Create the order service router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/orders", post(create_order).get(list_orders))
        .route("/api/orders/user/{phone}", get(customer_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/status", put(update_status))
}

async fn health() -> &'static str {
    "ok"
}

/// Resolve each line's unit price: caller-supplied if present, else catalog,
/// else the fixed fallback.
async fn resolve_items(state: &AppState, items: Vec<IncomingItem>) -> Result<Vec<OrderItem>> {
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        let quantity = u32::try_from(item.soluong)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| ApiError::Validation("Valid quantity required".to_owned()))?;

        let unit_price = match item.price {
            Some(price) => price,
            None => match state.price_source().unit_price(item.id).await {
                Ok(Some(price)) => price,
                Ok(None) => FALLBACK_UNIT_PRICE,
                Err(e) => {
                    tracing::warn!(product_id = %item.id, error = %e,
                        "catalog lookup failed, using fallback price");
                    FALLBACK_UNIT_PRICE
                }
            },
        };

        let note = item
            .note
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| bepviet_core::DEFAULT_ITEM_NOTE.to_owned());
        resolved.push(OrderItem {
            product_id: item.id,
            quantity,
            unit_price,
            note,
        });
    }
    Ok(resolved)
}

/// Decrement catalog stock for each line, best effort.
async fn apply_inventory(state: &AppState, items: &[OrderItem]) {
    for item in items {
        if let Err(e) = state
            .price_source()
            .decrease_inventory(item.product_id, item.quantity)
            .await
        {
            tracing::warn!(product_id = %item.product_id, error = %e,
                "inventory decrement failed");
        }
    }
}

/// Create order.
///
/// The authenticated customer comes from the gateway-forwarded identity; the
/// total is always recomputed server-side.
#[instrument(skip(state, identity, body))]
async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    if body.tenguoinhan.trim().is_empty() {
        return Err(ApiError::Validation("Recipient name required".to_owned()));
    }
    let recipient_phone = Phone::parse(&body.sdtnhan)
        .map_err(|e| ApiError::Validation(format!("Invalid recipient phone: {e}")))?;

    let recipient_address = match (
        body.hinhthucgiao.requires_address(),
        body.diachinhan.as_deref().map(str::trim),
    ) {
        (true, None | Some("")) => {
            return Err(ApiError::Validation(
                "Delivery address required".to_owned(),
            ));
        }
        (_, Some(address)) if !address.is_empty() => address.to_owned(),
        _ => PICKUP_ADDRESS.to_owned(),
    };

    if body.items.is_empty() {
        return Err(ApiError::Validation(
            "At least one item required".to_owned(),
        ));
    }

    let items = resolve_items(&state, body.items).await?;
    let total = compute_total(&items, body.hinhthucgiao)?;

    if let Some(claimed) = body.tongtien
        && claimed != total
    {
        tracing::warn!(
            customer = %identity.phone,
            claimed = claimed.amount(),
            computed = total.amount(),
            "client-supplied total mismatch, using server computation"
        );
    }

    let order = state
        .orders()
        .insert(NewOrder {
            customer_phone: identity.phone,
            delivery_method: body.hinhthucgiao,
            delivery_date: body.ngaygiaohang,
            delivery_slot: body.thoigiangiao.unwrap_or_default(),
            note: body.ghichu.unwrap_or_default(),
            recipient_name: body.tenguoinhan,
            recipient_phone,
            recipient_address,
            items,
            total,
        })
        .await;

    if state.config().inventory_policy == InventoryPolicy::OnCreate {
        apply_inventory(&state, &order.items).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Order created successfully",
            "order": order,
        })),
    ))
}

/// Get order by id.
#[instrument(skip(state))]
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order = state
        .orders()
        .get(&OrderId::from(id))
        .await
        .ok_or_else(|| ApiError::NotFound("Order not found".to_owned()))?;

    Ok(Json(json!({ "order": order })))
}

/// Get a customer's orders, newest first.
#[instrument(skip(state))]
async fn customer_orders(
    State(state): State<AppState>,
    Path(phone): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let phone = Phone::parse(&phone).map_err(|e| ApiError::Validation(e.to_string()))?;
    let orders = state.orders().by_customer(&phone).await;

    let (page, pagination) = paginate(
        &orders,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    );

    Ok(Json(json!({
        "orders": page,
        "pagination": pagination,
    })))
}

/// List all orders (admin only).
#[instrument(skip(state, _admin))]
async fn list_orders(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let status = match query.status.as_deref() {
        None | Some("2") => None,
        Some(raw) => {
            let code: u8 = raw
                .parse()
                .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?;
            Some(
                OrderStatus::try_from(code)
                    .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?,
            )
        }
    };

    let date_range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };

    let orders = state
        .orders()
        .list(&OrderFilter {
            status,
            search: query.search,
            date_range,
        })
        .await;

    let (page, pagination) = paginate(
        &orders,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    );

    Ok(Json(json!({
        "orders": page,
        "pagination": pagination,
    })))
}

/// Update order status (admin only).
#[instrument(skip(state, _admin))]
async fn update_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<impl IntoResponse> {
    let status = OrderStatus::try_from(body.status)
        .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?;

    let (previous, order) = state
        .orders()
        .set_status(&OrderId::from(id), status)
        .await?;

    if state.config().inventory_policy == InventoryPolicy::OnFulfillment
        && previous == OrderStatus::Pending
        && status == OrderStatus::Completed
    {
        apply_inventory(&state, &order.items).await;
    }

    Ok(Json(json!({
        "message": "Order status updated successfully",
        "order": order,
    })))
}

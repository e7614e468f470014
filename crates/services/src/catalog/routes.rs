//! Product catalog route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use bepviet_core::{Price, ProductCategory, ProductId, ProductStatus};

use super::{InventoryOp, ProductFilter, ProductPatch, ProductSpec, SortField};
use crate::error::{ApiError, Result};
use crate::pagination::paginate;
use crate::state::AppState;

const MIN_TITLE_LENGTH: usize = 3;
const MIN_DESCRIPTION_LENGTH: usize = 10;
const DEFAULT_PAGE_SIZE: u32 = 12;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    /// `"all"`, or an integer status code; defaults to active.
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Create-product request body.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub category: ProductCategory,
    pub price: Price,
    pub img: String,
    pub desc: String,
    pub inventory: Option<u32>,
}

/// Update-product request body; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Price>,
    pub img: Option<String>,
    pub desc: Option<String>,
    pub status: Option<ProductStatus>,
    pub inventory: Option<u32>,
}

/// Inventory adjustment request body.
#[derive(Debug, Deserialize)]
pub struct InventoryRequest {
    pub quantity: u32,
    #[serde(default)]
    pub operation: InventoryOp,
}

/// Create the product catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/categories/list", get(list_categories))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/{id}/inventory", patch(adjust_inventory))
}

async fn health() -> &'static str {
    "ok"
}

fn parse_filter(query: &ListQuery) -> Result<ProductFilter> {
    // Status defaults to active; "all" disables the filter.
    let status = match query.status.as_deref() {
        Some("all") => None,
        Some(raw) => {
            let code: u8 = raw
                .parse()
                .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?;
            Some(
                ProductStatus::try_from(code)
                    .map_err(|_| ApiError::Validation("Invalid status value".to_owned()))?,
            )
        }
        None => Some(ProductStatus::Active),
    };

    let category = query.category.clone().filter(|c| c != "all");

    let sort_by = match query.sort_by.as_deref() {
        None => SortField::CreatedAt,
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Validation("Invalid sort field".to_owned()))?,
    };

    Ok(ProductFilter {
        category,
        status,
        search: query.search.clone(),
        sort_by,
        descending: query.sort_order.as_deref() != Some("asc"),
    })
}

/// Get all products with filtering and pagination.
#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let filter = parse_filter(&query)?;
    let products = state.catalog().list(&filter).await;

    let (page, pagination) = paginate(
        &products,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    Ok(Json(json!({
        "products": page,
        "pagination": pagination,
    })))
}

/// Get product by id.
#[instrument(skip(state))]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let product = state
        .catalog()
        .get(ProductId::new(id))
        .await
        .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

    Ok(Json(json!({ "product": product })))
}

/// Get distinct categories of active products.
#[instrument(skip(state))]
async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    let categories = state.catalog().categories().await;
    Json(json!({ "categories": categories }))
}

fn validate_title(title: &str) -> Result<()> {
    if title.chars().count() < MIN_TITLE_LENGTH {
        return Err(ApiError::Validation(format!(
            "title must be at least {MIN_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_description(desc: &str) -> Result<()> {
    if desc.chars().count() < MIN_DESCRIPTION_LENGTH {
        return Err(ApiError::Validation(format!(
            "description must be at least {MIN_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Create product. Admin-only by deployment convention: the gateway does not
/// expose catalog mutations to storefront traffic.
#[instrument(skip(state, body))]
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    validate_title(&body.title)?;
    validate_description(&body.desc)?;

    let product = state
        .catalog()
        .insert(ProductSpec {
            title: body.title,
            category: body.category,
            price: body.price,
            image: body.img,
            description: body.desc,
            inventory: body.inventory.unwrap_or(0),
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "product": product,
        })),
    ))
}

/// Update product.
#[instrument(skip(state, body))]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse> {
    if let Some(title) = &body.title {
        validate_title(title)?;
    }
    if let Some(desc) = &body.desc {
        validate_description(desc)?;
    }

    let product = state
        .catalog()
        .update(
            ProductId::new(id),
            ProductPatch {
                title: body.title,
                category: body.category,
                price: body.price,
                image: body.img,
                description: body.desc,
                status: body.status,
                inventory: body.inventory,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "Product updated successfully",
        "product": product,
    })))
}

/// Delete product.
#[instrument(skip(state))]
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.catalog().delete(ProductId::new(id)).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Update inventory after an order.
#[instrument(skip(state, body))]
async fn adjust_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<InventoryRequest>,
) -> Result<impl IntoResponse> {
    if body.quantity == 0 {
        return Err(ApiError::Validation("Valid quantity required".to_owned()));
    }

    let product = state
        .catalog()
        .adjust_inventory(ProductId::new(id), body.quantity, body.operation)
        .await?;

    Ok(Json(json!({
        "message": "Inventory updated successfully",
        "product": product,
    })))
}

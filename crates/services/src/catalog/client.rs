//! HTTP catalog access for split deployments.
//!
//! When the order service runs apart from the catalog it resolves prices via
//! this client instead of the in-process repository.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use bepviet_core::{Price, ProductId};

use super::Product;
use crate::error::{ApiError, Result};

/// Request timeout for catalog lookups.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the product catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

impl CatalogClient {
    /// Create a client against the catalog's base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(CatalogClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_owned(),
            }),
        }
    }

    /// Fetch a product's unit price; `Ok(None)` when the catalog has no such
    /// product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Upstream` when the catalog is unreachable or
    /// responds with an unexpected status.
    pub async fn unit_price(&self, id: ProductId) -> Result<Option<Price>> {
        let url = format!("{}/api/products/{id}", self.inner.base_url);
        let response = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("catalog request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "catalog returned {}",
                response.status()
            )));
        }

        let envelope: ProductEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("catalog response malformed: {e}")))?;
        Ok(Some(envelope.product.price))
    }

    /// Decrement stock for a fulfilled line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Upstream` when the catalog is unreachable or
    /// rejects the adjustment.
    pub async fn decrease_inventory(&self, id: ProductId, quantity: u32) -> Result<()> {
        let url = format!("{}/api/products/{id}/inventory", self.inner.base_url);
        let response = self
            .inner
            .http
            .patch(&url)
            .json(&json!({ "quantity": quantity, "operation": "decrease" }))
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("catalog request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "inventory adjustment returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

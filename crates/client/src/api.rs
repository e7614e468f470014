//! HTTP client for the gateway API.
//!
//! Thin typed wrapper over reqwest with a fixed request timeout. Transport
//! failures and HTTP error statuses map to distinct [`ClientError`] variants
//! so the reconciler can tell "unreachable" from "rejected".

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use bepviet_core::{CartItem, ProductId};

use crate::cache::ProductSnapshot;
use crate::checkout::OrderPayload;
use crate::error::ClientError;

/// Fixed client-side request timeout; a hung cart tier must not hang the
/// storefront.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Client for the Bep Viet gateway API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct CartEnvelope {
    cart: Vec<CartItem>,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<ProductSnapshot>,
}

/// Response to a successful registration or login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: serde_json::Value,
    pub token: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    fullname: &'a str,
    phone: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
}

impl ApiClient {
    /// Create a client against the gateway base URL.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_owned(),
                token: RwLock::new(None),
            }),
        }
    }

    /// Attach a bearer token to subsequent requests.
    pub fn set_token(&self, token: &str) {
        if let Ok(mut slot) = self.inner.token.write() {
            *slot = Some(token.to_owned());
        }
    }

    /// Drop the bearer token.
    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.inner.token.write() {
            *slot = None;
        }
    }

    /// Whether a bearer token is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .token
            .read()
            .map(|t| t.is_some())
            .unwrap_or(false)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.token.read().ok().and_then(|t| t.clone()) {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and decode the JSON body, classifying failures.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.authorize(req).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
                .unwrap_or_else(|| body.clone());
            return Err(ClientError::Api { status, message });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register an account; the returned token is attached to this client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection (409 duplicate, 400 invalid)
    /// or `ClientError::Transport` when the gateway is unreachable.
    pub async fn register(
        &self,
        fullname: &str,
        phone: &str,
        password: &str,
        email: Option<&str>,
        address: Option<&str>,
    ) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .execute(self.inner.http.post(self.url("/api/users/register")).json(
                &RegisterRequest {
                    fullname,
                    phone,
                    password,
                    email,
                    address,
                },
            ))
            .await?;
        self.set_token(&auth.token);
        Ok(auth)
    }

    /// Log in; the returned token is attached to this client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection or `ClientError::Transport`
    /// when the gateway is unreachable.
    pub async fn login(&self, phone: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .execute(
                self.inner
                    .http
                    .post(self.url("/api/users/login"))
                    .json(&json!({ "phone": phone, "password": password })),
            )
            .await?;
        self.set_token(&auth.token);
        Ok(auth)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch the active product listing as a pricing snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn get_products(&self, limit: u32) -> Result<Vec<ProductSnapshot>, ClientError> {
        let envelope: ProductsEnvelope = self
            .execute(
                self.inner
                    .http
                    .get(self.url("/api/products"))
                    .query(&[("limit", limit.to_string())]),
            )
            .await?;
        Ok(envelope.products)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the remote cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn get_cart(&self, user_id: &str) -> Result<Vec<CartItem>, ClientError> {
        let envelope: CartEnvelope = self
            .execute(self.inner.http.get(self.url(&format!("/api/cart/{user_id}"))))
            .await?;
        Ok(envelope.cart)
    }

    /// Merge an item into the remote cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn add_cart_item(
        &self,
        user_id: &str,
        item: &CartItem,
    ) -> Result<Vec<CartItem>, ClientError> {
        let envelope: CartEnvelope = self
            .execute(
                self.inner
                    .http
                    .post(self.url(&format!("/api/cart/{user_id}/items")))
                    .json(item),
            )
            .await?;
        Ok(envelope.cart)
    }

    /// Set an item's absolute quantity in the remote cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn update_cart_item(
        &self,
        user_id: &str,
        product_id: ProductId,
        quantity: i64,
        note: Option<&str>,
    ) -> Result<Vec<CartItem>, ClientError> {
        let mut body = json!({ "soluong": quantity });
        if let Some(note) = note {
            body["note"] = json!(note);
        }
        let envelope: CartEnvelope = self
            .execute(
                self.inner
                    .http
                    .put(self.url(&format!("/api/cart/{user_id}/items/{product_id}")))
                    .json(&body),
            )
            .await?;
        Ok(envelope.cart)
    }

    /// Remove an item from the remote cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn remove_cart_item(
        &self,
        user_id: &str,
        product_id: ProductId,
    ) -> Result<Vec<CartItem>, ClientError> {
        let envelope: CartEnvelope = self
            .execute(
                self.inner
                    .http
                    .delete(self.url(&format!("/api/cart/{user_id}/items/{product_id}"))),
            )
            .await?;
        Ok(envelope.cart)
    }

    /// Delete the whole remote cart entry.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn clear_cart(&self, user_id: &str) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .execute(
                self.inner
                    .http
                    .delete(self.url(&format!("/api/cart/{user_id}"))),
            )
            .await?;
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection or `ClientError::Transport`
    /// when the gateway is unreachable; the caller decides what happens to
    /// the cart.
    pub async fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> Result<serde_json::Value, ClientError> {
        let body: serde_json::Value = self
            .execute(self.inner.http.post(self.url("/api/orders")).json(payload))
            .await?;
        Ok(body.get("order").cloned().unwrap_or(body))
    }

    /// Fetch a customer's order history.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` / `ClientError::Api` as classified.
    pub async fn get_orders(
        &self,
        phone: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        let body: serde_json::Value = self
            .execute(
                self.inner
                    .http
                    .get(self.url(&format!("/api/orders/user/{phone}")))
                    .query(&[("page", page.to_string()), ("limit", limit.to_string())]),
            )
            .await?;
        Ok(body
            .get("orders")
            .and_then(|o| o.as_array())
            .cloned()
            .unwrap_or_default())
    }
}

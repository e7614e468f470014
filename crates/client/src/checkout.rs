//! Checkout pricing and order submission.
//!
//! Pricing resolves each cart line against the locally cached product
//! snapshot; unknown products get a placeholder title and the fixed fallback
//! price so the checkout never dead-ends on a missing catalog entry.
//! Toggling the delivery selector is a pure recomputation over the same
//! lines, no re-fetch.

use chrono::NaiveDate;
use serde::Serialize;

use bepviet_core::{
    CartItem, DeliveryMethod, FALLBACK_UNIT_PRICE, Phone, Price, PriceError, ProductId,
    SHIPPING_FEE,
};

use crate::cache::ProductSnapshot;
use crate::error::ClientError;
use crate::reconciler::CartSession;

/// A priced cart line, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    /// False when the product was missing from the snapshot and the
    /// fallback price was substituted.
    pub resolved: bool,
}

/// A fully priced cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub lines: Vec<QuoteLine>,
    pub subtotal: Price,
    /// The surcharge actually applied (zero for pickup).
    pub shipping: Price,
    pub total: Price,
}

/// Price the cart against a product snapshot for the chosen delivery method.
///
/// # Errors
///
/// Returns `PriceError::Overflow` on arithmetic overflow.
pub fn quote(
    items: &[CartItem],
    products: &[ProductSnapshot],
    method: DeliveryMethod,
) -> Result<PriceQuote, PriceError> {
    let mut lines = Vec::with_capacity(items.len());
    let mut subtotal = Price::ZERO;

    for item in items {
        let snapshot = products.iter().find(|p| p.id == item.product_id);
        let (title, unit_price, resolved) = match snapshot {
            Some(p) => (p.title.clone(), p.price, true),
            None => (
                format!("Sản phẩm #{}", item.product_id),
                FALLBACK_UNIT_PRICE,
                false,
            ),
        };

        let line_total = unit_price.checked_mul(item.quantity)?;
        subtotal = subtotal.checked_add(line_total)?;
        lines.push(QuoteLine {
            product_id: item.product_id,
            title,
            quantity: item.quantity,
            unit_price,
            line_total,
            resolved,
        });
    }

    let shipping = match method {
        DeliveryMethod::Delivery => SHIPPING_FEE,
        DeliveryMethod::Pickup => Price::ZERO,
    };
    let total = subtotal.checked_add(shipping)?;

    Ok(PriceQuote {
        lines,
        subtotal,
        shipping,
        total,
    })
}

/// Delivery form state collected from the checkout UI.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub delivery_method: DeliveryMethod,
    pub delivery_date: NaiveDate,
    pub delivery_slot: Option<String>,
    pub note: Option<String>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: Option<String>,
}

impl CheckoutForm {
    /// Required-field validation, run before any network call.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.recipient_name.trim().is_empty() {
            return Err(ClientError::Validation(
                "Vui lòng nhập tên người nhận".to_owned(),
            ));
        }
        if self.recipient_phone.trim().is_empty() {
            return Err(ClientError::Validation(
                "Vui lòng nhập số điện thoại".to_owned(),
            ));
        }
        if Phone::parse(self.recipient_phone.trim()).is_err() {
            return Err(ClientError::Validation(
                "Số điện thoại phải có đúng 10 chữ số".to_owned(),
            ));
        }
        if self.delivery_method.requires_address()
            && self
                .recipient_address
                .as_deref()
                .is_none_or(|a| a.trim().is_empty())
        {
            return Err(ClientError::Validation(
                "Vui lòng nhập địa chỉ giao hàng".to_owned(),
            ));
        }
        Ok(())
    }
}

/// The order submission body, in wire vocabulary.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPayload {
    pub hinhthucgiao: DeliveryMethod,
    pub ngaygiaohang: NaiveDate,
    pub thoigiangiao: String,
    pub ghichu: String,
    pub tenguoinhan: String,
    pub sdtnhan: String,
    pub diachinhan: String,
    /// Client-computed total; the server recomputes and only warns on
    /// mismatch.
    pub tongtien: Price,
    pub items: Vec<PayloadItem>,
}

/// An order line with its locally resolved price, sparing the order service
/// a catalog round trip.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadItem {
    pub id: ProductId,
    pub soluong: u32,
    pub note: String,
    pub price: Price,
}

/// A successfully placed order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: String,
    pub total: Price,
    pub raw: serde_json::Value,
}

/// Build the submission payload from the priced cart and the form.
fn build_payload(items: &[CartItem], quote: &PriceQuote, form: &CheckoutForm) -> OrderPayload {
    let payload_items = items
        .iter()
        .map(|item| {
            let line = quote.lines.iter().find(|l| l.product_id == item.product_id);
            PayloadItem {
                id: item.product_id,
                soluong: item.quantity,
                note: item.note.clone(),
                price: line.map_or(FALLBACK_UNIT_PRICE, |l| l.unit_price),
            }
        })
        .collect();

    OrderPayload {
        hinhthucgiao: form.delivery_method,
        ngaygiaohang: form.delivery_date,
        thoigiangiao: form.delivery_slot.clone().unwrap_or_default(),
        ghichu: form.note.clone().unwrap_or_default(),
        tenguoinhan: form.recipient_name.trim().to_owned(),
        sdtnhan: form.recipient_phone.trim().to_owned(),
        diachinhan: form
            .recipient_address
            .clone()
            .unwrap_or_default()
            .trim()
            .to_owned(),
        tongtien: quote.total,
        items: payload_items,
    }
}

impl CartSession {
    /// Price the current cart against the cached product snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` on price overflow (pathological
    /// quantities).
    pub fn price_quote(&self, method: DeliveryMethod) -> Result<PriceQuote, ClientError> {
        let products = self.cache.load_products();
        quote(self.items(), &products, method)
            .map_err(|e: PriceError| ClientError::Validation(e.to_string()))
    }

    /// Submit the reconciled cart as an order.
    ///
    /// On success the cart is cleared remotely (best effort) and locally,
    /// and the order is buffered into the local history. On failure the cart
    /// is left untouched so the user can retry.
    ///
    /// # Errors
    ///
    /// - `ClientError::Validation` for form errors or an empty cart
    /// - `ClientError::NotAuthenticated` when not signed in
    /// - `ClientError::Api` / `ClientError::Transport` when submission fails
    pub async fn submit_order(&mut self, form: &CheckoutForm) -> Result<PlacedOrder, ClientError> {
        form.validate()?;

        let Some(user) = self.user.clone() else {
            return Err(ClientError::NotAuthenticated);
        };

        if self.items.is_empty() {
            return Err(ClientError::Validation("Giỏ hàng trống".to_owned()));
        }

        let quote = self.price_quote(form.delivery_method)?;
        let payload = build_payload(&self.items, &quote, form);

        let order = self.api.create_order(&payload).await?;

        // Exactly-once cart clearing: remote best effort, local always
        if let Err(e) = self.api.clear_cart(user.as_str()).await {
            tracing::warn!(error = %e, "remote cart clear failed after order");
        }
        self.items.clear();
        self.cache.store_cart(&self.items);
        self.cache.push_order(&order);

        let id = order
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_owned();
        let total = order
            .get("tongtien")
            .and_then(serde_json::Value::as_i64)
            .and_then(|v| Price::try_from(v).ok())
            .unwrap_or(quote.total);

        Ok(PlacedOrder {
            id,
            total,
            raw: order,
        })
    }

    /// The customer's order history: the order store when reachable, the
    /// locally buffered copy otherwise (or when signed out).
    pub async fn order_history(&self, page: u32, limit: u32) -> Vec<serde_json::Value> {
        if let Some(user) = &self.user {
            match self.api.get_orders(user.as_str(), page, limit).await {
                Ok(orders) => return orders,
                Err(e) => {
                    tracing::warn!(error = %e, "order history fetch failed, using local buffer");
                }
            }
        }
        self.cache.load_orders()
    }
}

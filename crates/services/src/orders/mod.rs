//! Order store.
//!
//! Orders are immutable once created except for the pending -> completed
//! status transition. Ids are human-facing `DH<n>` tokens: generation starts
//! at `count + 1` and probes upward past existing ids. Gaps left by the
//! count-based start are never refilled. Probe and insert run under one
//! write lock, so concurrent creations cannot pick the same id.

pub mod routes;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use bepviet_core::{
    DeliveryMethod, OrderId, OrderItem, OrderStatus, Phone, Price, PriceError, SHIPPING_FEE,
};

use crate::error::{ApiError, Result};

/// A finalized order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "khachhang")]
    pub customer_phone: Phone,
    #[serde(rename = "hinhthucgiao")]
    pub delivery_method: DeliveryMethod,
    #[serde(rename = "ngaygiaohang")]
    pub delivery_date: NaiveDate,
    #[serde(rename = "thoigiangiao", default)]
    pub delivery_slot: String,
    #[serde(rename = "ghichu", default)]
    pub note: String,
    #[serde(rename = "tenguoinhan")]
    pub recipient_name: String,
    #[serde(rename = "sdtnhan")]
    pub recipient_phone: Phone,
    #[serde(rename = "diachinhan")]
    pub recipient_address: String,
    #[serde(rename = "tongtien")]
    pub total: Price,
    #[serde(rename = "trangthai")]
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A validated, fully priced order awaiting an id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_phone: Phone,
    pub delivery_method: DeliveryMethod,
    pub delivery_date: NaiveDate,
    pub delivery_slot: String,
    pub note: String,
    pub recipient_name: String,
    pub recipient_phone: Phone,
    pub recipient_address: String,
    /// Lines with their captured unit prices.
    pub items: Vec<OrderItem>,
    /// Server-computed total.
    pub total: Price,
}

/// Admin listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring over id, recipient name, and customer phone.
    pub search: Option<String>,
    /// Inclusive creation-date range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Sum of line totals, plus the shipping surcharge for deliveries.
///
/// This is the only place a total is computed; caller-supplied totals are
/// never trusted (see [`routes::create_order`]).
///
/// # Errors
///
/// Returns `PriceError::Overflow` on arithmetic overflow.
pub fn compute_total(
    items: &[OrderItem],
    method: DeliveryMethod,
) -> std::result::Result<Price, PriceError> {
    let mut total = Price::ZERO;
    for item in items {
        total = total.checked_add(item.unit_price.checked_mul(item.quantity)?)?;
    }
    if method == DeliveryMethod::Delivery {
        total = total.checked_add(SHIPPING_FEE)?;
    }
    Ok(total)
}

/// In-process order repository.
#[derive(Clone)]
pub struct OrderStore {
    inner: Arc<RwLock<Vec<Order>>>,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Persist a new order, assigning its id.
    pub async fn insert(&self, new: NewOrder) -> Order {
        let mut orders = self.inner.write().await;
        let id = next_order_id(&orders);

        let order = Order {
            id,
            customer_phone: new.customer_phone,
            delivery_method: new.delivery_method,
            delivery_date: new.delivery_date,
            delivery_slot: new.delivery_slot,
            note: new.note,
            recipient_name: new.recipient_name,
            recipient_phone: new.recipient_phone,
            recipient_address: new.recipient_address,
            total: new.total,
            status: OrderStatus::Pending,
            items: new.items,
            created_at: Utc::now(),
        };
        orders.push(order.clone());
        order
    }

    /// Look up an order by id.
    pub async fn get(&self, id: &OrderId) -> Option<Order> {
        self.inner.read().await.iter().find(|o| &o.id == id).cloned()
    }

    /// A customer's orders, newest first.
    pub async fn by_customer(&self, phone: &Phone) -> Vec<Order> {
        let orders = self.inner.read().await;
        let mut matched: Vec<Order> = orders
            .iter()
            .filter(|o| &o.customer_phone == phone)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }

    /// Orders matching the filter, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let orders = self.inner.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);

        let mut matched: Vec<Order> = orders
            .iter()
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| {
                needle.as_deref().is_none_or(|n| {
                    o.id.as_str().to_lowercase().contains(n)
                        || o.recipient_name.to_lowercase().contains(n)
                        || o.customer_phone.as_str().contains(n)
                })
            })
            .filter(|o| {
                filter.date_range.is_none_or(|(start, end)| {
                    let created = o.created_at.date_naive();
                    created >= start && created <= end
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }

    /// Set an order's status, returning the previous status and the updated
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(OrderStatus, Order)> {
        let mut orders = self.inner.write().await;
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| ApiError::NotFound("Order not found".to_owned()))?;

        let previous = order.status;
        order.status = status;
        Ok((previous, order.clone()))
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Next free `DH<n>` starting the probe at `count + 1`.
fn next_order_id(orders: &[Order]) -> OrderId {
    let mut n = orders.len() as u64 + 1;
    while orders.iter().any(|o| o.id == OrderId::from_sequence(n)) {
        n += 1;
    }
    OrderId::from_sequence(n)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bepviet_core::ProductId;

    fn new_order(phone: &str) -> NewOrder {
        let items = vec![OrderItem {
            product_id: ProductId::new(7),
            quantity: 1,
            unit_price: Price::new(25_000),
            note: "Không có ghi chú".to_owned(),
        }];
        let total = compute_total(&items, DeliveryMethod::Pickup).unwrap();
        NewOrder {
            customer_phone: Phone::parse(phone).unwrap(),
            delivery_method: DeliveryMethod::Pickup,
            delivery_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            delivery_slot: String::new(),
            note: String::new(),
            recipient_name: "Nguyễn Văn A".to_owned(),
            recipient_phone: Phone::parse("0912345678").unwrap(),
            recipient_address: "Lấy tại cửa hàng".to_owned(),
            items,
            total,
        }
    }

    #[test]
    fn test_compute_total_pickup() {
        let items = vec![
            OrderItem {
                product_id: ProductId::new(1),
                quantity: 2,
                unit_price: Price::new(10_000),
                note: String::new(),
            },
            OrderItem {
                product_id: ProductId::new(2),
                quantity: 1,
                unit_price: Price::new(5_000),
                note: String::new(),
            },
        ];
        assert_eq!(
            compute_total(&items, DeliveryMethod::Pickup).unwrap(),
            Price::new(25_000)
        );
    }

    #[test]
    fn test_compute_total_delivery_adds_surcharge() {
        let items = vec![
            OrderItem {
                product_id: ProductId::new(1),
                quantity: 2,
                unit_price: Price::new(10_000),
                note: String::new(),
            },
            OrderItem {
                product_id: ProductId::new(2),
                quantity: 1,
                unit_price: Price::new(5_000),
                note: String::new(),
            },
        ];
        assert_eq!(
            compute_total(&items, DeliveryMethod::Delivery).unwrap(),
            Price::new(55_000)
        );
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let store = OrderStore::new();
        for expected in ["DH1", "DH2", "DH3"] {
            let order = store.insert(new_order("0911111111")).await;
            assert_eq!(order.id.as_str(), expected);
        }

        let next = store.insert(new_order("0911111111")).await;
        assert_eq!(next.id.as_str(), "DH4");
    }

    fn order_with_id(id: &str) -> Order {
        let new = new_order("0911111111");
        Order {
            id: OrderId::from(id),
            customer_phone: new.customer_phone,
            delivery_method: new.delivery_method,
            delivery_date: new.delivery_date,
            delivery_slot: new.delivery_slot,
            note: new.note,
            recipient_name: new.recipient_name,
            recipient_phone: new.recipient_phone,
            recipient_address: new.recipient_address,
            total: new.total,
            status: OrderStatus::Pending,
            items: new.items,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_id_probe_does_not_refill_gaps() {
        // With [DH1, DH3] the probe starts at count + 1 = 3, finds DH3 taken,
        // and lands on DH4; DH2 stays vacant.
        let orders = vec![order_with_id("DH1"), order_with_id("DH3")];
        assert_eq!(next_order_id(&orders).as_str(), "DH4");
    }

    #[tokio::test]
    async fn test_get_absent_is_none() {
        let store = OrderStore::new();
        assert!(store.get(&OrderId::from("DH9")).await.is_none());
    }

    #[tokio::test]
    async fn test_by_customer_filters_phone() {
        let store = OrderStore::new();
        store.insert(new_order("0911111111")).await;
        store.insert(new_order("0922222222")).await;

        let mine = store
            .by_customer(&Phone::parse("0911111111").unwrap())
            .await;
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn test_list_search_matches_id_and_recipient() {
        let store = OrderStore::new();
        let order = store.insert(new_order("0911111111")).await;

        let filter = OrderFilter {
            search: Some(order.id.as_str().to_lowercase()),
            ..Default::default()
        };
        assert_eq!(store.list(&filter).await.len(), 1);

        let filter = OrderFilter {
            search: Some("nguyễn".to_owned()),
            ..Default::default()
        };
        assert_eq!(store.list(&filter).await.len(), 1);

        let filter = OrderFilter {
            search: Some("khongco".to_owned()),
            ..Default::default()
        };
        assert!(store.list(&filter).await.is_empty());
    }

    #[tokio::test]
    async fn test_set_status_reports_previous() {
        let store = OrderStore::new();
        let order = store.insert(new_order("0911111111")).await;

        let (previous, updated) = store
            .set_status(&order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(updated.status, OrderStatus::Completed);

        let err = store
            .set_status(&OrderId::from("DH99"), OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_status() {
        let store = OrderStore::new();
        let order = store.insert(new_order("0911111111")).await;
        store.insert(new_order("0911111111")).await;
        store
            .set_status(&order.id, OrderStatus::Completed)
            .await
            .unwrap();

        let filter = OrderFilter {
            status: Some(OrderStatus::Completed),
            ..Default::default()
        };
        let completed = store.list(&filter).await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed.first().unwrap().id, order.id);
    }
}

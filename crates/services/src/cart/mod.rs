//! Per-user cart store.
//!
//! Carts are transient: each user's line list lives in a TTL cache and
//! disappears an hour after the last write. Every mutation re-inserts the
//! whole entry, refreshing its expiry window, which mirrors how a
//! `SETEX cart:<user>` key-value store behaves.

pub mod routes;

use std::time::Duration;

use moka::future::Cache;

use bepviet_core::{CartItem, ProductId};

use crate::error::{ApiError, Result};

/// Upper bound on distinct carts kept in memory.
const MAX_CARTS: u64 = 10_000;

/// TTL key-value store of cart lines, keyed per user.
#[derive(Clone)]
pub struct CartStore {
    cache: Cache<String, Vec<CartItem>>,
}

impl CartStore {
    /// Create a store whose entries expire `ttl` after their last write.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CARTS)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// The user's cart, or an empty list if absent or expired.
    pub async fn get(&self, user_id: &str) -> Vec<CartItem> {
        self.cache.get(user_id).await.unwrap_or_default()
    }

    /// Merge a line into the cart.
    ///
    /// An existing line for the same product has its quantity summed and its
    /// note overwritten; otherwise the line is appended. The entry's expiry
    /// window restarts.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the quantity is zero.
    pub async fn add_item(&self, user_id: &str, item: CartItem) -> Result<Vec<CartItem>> {
        if item.quantity == 0 {
            return Err(ApiError::Validation("Valid quantity required".to_owned()));
        }

        let mut cart = self.get(user_id).await;
        if let Some(existing) = cart.iter_mut().find(|l| l.product_id == item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing.note = item.note;
        } else {
            cart.push(item);
        }

        self.cache.insert(user_id.to_owned(), cart.clone()).await;
        Ok(cart)
    }

    /// Set the absolute quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the cart has no line for the product.
    pub async fn update_item(
        &self,
        user_id: &str,
        product_id: ProductId,
        quantity: u32,
        note: Option<String>,
    ) -> Result<Vec<CartItem>> {
        let mut cart = self.get(user_id).await;
        let Some(pos) = cart.iter().position(|l| l.product_id == product_id) else {
            return Err(ApiError::NotFound("Item not found in cart".to_owned()));
        };

        if quantity == 0 {
            cart.remove(pos);
        } else if let Some(line) = cart.get_mut(pos) {
            line.quantity = quantity;
            if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
                line.note = note;
            }
        }

        self.cache.insert(user_id.to_owned(), cart.clone()).await;
        Ok(cart)
    }

    /// Remove a line; no-op when absent.
    pub async fn remove_item(&self, user_id: &str, product_id: ProductId) -> Vec<CartItem> {
        let mut cart = self.get(user_id).await;
        cart.retain(|l| l.product_id != product_id);
        self.cache.insert(user_id.to_owned(), cart.clone()).await;
        cart
    }

    /// Delete the whole entry.
    pub async fn clear(&self, user_id: &str) {
        self.cache.invalidate(user_id).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> CartStore {
        CartStore::new(Duration::from_secs(3600))
    }

    fn item(id: i64, quantity: u32) -> CartItem {
        CartItem::new(ProductId::new(id), quantity, None)
    }

    #[tokio::test]
    async fn test_get_absent_is_empty() {
        assert!(store().get("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_add_merges_same_product() {
        let store = store();
        store.add_item("u1", item(7, 1)).await.unwrap();
        let cart = store.add_item("u1", item(7, 2)).await.unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_add_overwrites_note_on_merge() {
        let store = store();
        store
            .add_item("u1", CartItem::new(ProductId::new(7), 1, Some("cay".into())))
            .await
            .unwrap();
        let cart = store
            .add_item(
                "u1",
                CartItem::new(ProductId::new(7), 1, Some("không cay".into())),
            )
            .await
            .unwrap();

        assert_eq!(cart.first().unwrap().note, "không cay");
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let err = store().add_item("u1", item(7, 0)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_zero_removes() {
        let store = store();
        store.add_item("u1", item(7, 3)).await.unwrap();

        let cart = store
            .update_item("u1", ProductId::new(7), 0, None)
            .await
            .unwrap();
        assert!(cart.is_empty());

        let after_remove = store.get("u1").await;
        let after_explicit = store.remove_item("u2", ProductId::new(7)).await;
        assert_eq!(after_remove, after_explicit);
    }

    #[tokio::test]
    async fn test_update_sets_absolute_quantity() {
        let store = store();
        store.add_item("u1", item(7, 3)).await.unwrap();

        let cart = store
            .update_item("u1", ProductId::new(7), 1, None)
            .await
            .unwrap();
        assert_eq!(cart.first().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_update_absent_is_not_found() {
        let err = store()
            .update_item("u1", ProductId::new(9), 2, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let store = store();
        store.add_item("u1", item(7, 1)).await.unwrap();
        let cart = store.remove_item("u1", ProductId::new(99)).await;
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_then_get_is_empty() {
        let store = store();
        store.add_item("u1", item(7, 1)).await.unwrap();
        store.clear("u1").await;
        assert!(store.get("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = CartStore::new(Duration::from_millis(50));
        store.add_item("u1", item(7, 1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.get("u1").await.is_empty());
    }
}

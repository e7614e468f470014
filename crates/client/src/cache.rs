//! Persistent local cache, the browser-localStorage analogue.
//!
//! Holds the cart snapshot, the product catalog snapshot used for pricing,
//! the signed-in session, and a buffered order history shown when the order
//! store is unreachable.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use bepviet_core::{CartItem, Phone, Price, ProductId};

/// The slice of a product the client needs for pricing and display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
}

/// A signed-in user session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub phone: Phone,
    pub full_name: String,
    pub token: String,
}

/// Everything the cache persists, as one document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheData {
    cart: Vec<CartItem>,
    products: Vec<ProductSnapshot>,
    session: Option<Session>,
    orders: Vec<serde_json::Value>,
}

/// Persistent client-side state.
///
/// Implementations are synchronous: payloads are small and the browser
/// analogue is synchronous too.
pub trait LocalCache: Send + Sync {
    /// The cached cart snapshot.
    fn load_cart(&self) -> Vec<CartItem>;
    /// Replace the cached cart snapshot.
    fn store_cart(&self, items: &[CartItem]);

    /// The cached product snapshot.
    fn load_products(&self) -> Vec<ProductSnapshot>;
    /// Replace the cached product snapshot.
    fn store_products(&self, products: &[ProductSnapshot]);

    /// The signed-in session, if any.
    fn load_session(&self) -> Option<Session>;
    /// Replace (or clear) the signed-in session.
    fn store_session(&self, session: Option<&Session>);

    /// Locally buffered order history, newest first.
    fn load_orders(&self) -> Vec<serde_json::Value>;
    /// Prepend an order to the buffered history.
    fn push_order(&self, order: &serde_json::Value);
}

/// In-memory cache; state dies with the process.
#[derive(Default)]
pub struct MemoryCache {
    data: Mutex<CacheData>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn load_cart(&self) -> Vec<CartItem> {
        self.data.lock().map(|d| d.cart.clone()).unwrap_or_default()
    }

    fn store_cart(&self, items: &[CartItem]) {
        if let Ok(mut data) = self.data.lock() {
            data.cart = items.to_vec();
        }
    }

    fn load_products(&self) -> Vec<ProductSnapshot> {
        self.data
            .lock()
            .map(|d| d.products.clone())
            .unwrap_or_default()
    }

    fn store_products(&self, products: &[ProductSnapshot]) {
        if let Ok(mut data) = self.data.lock() {
            data.products = products.to_vec();
        }
    }

    fn load_session(&self) -> Option<Session> {
        self.data.lock().ok().and_then(|d| d.session.clone())
    }

    fn store_session(&self, session: Option<&Session>) {
        if let Ok(mut data) = self.data.lock() {
            data.session = session.cloned();
        }
    }

    fn load_orders(&self) -> Vec<serde_json::Value> {
        self.data
            .lock()
            .map(|d| d.orders.clone())
            .unwrap_or_default()
    }

    fn push_order(&self, order: &serde_json::Value) {
        if let Ok(mut data) = self.data.lock() {
            data.orders.insert(0, order.clone());
        }
    }
}

/// JSON-file-backed cache; survives restarts.
///
/// The whole document is re-read and re-written on each access; payloads are
/// a few kilobytes. I/O errors degrade to empty state rather than failing
/// the storefront.
pub struct JsonFileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileCache {
    /// Create a cache backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> CacheData {
        let Ok(_guard) = self.lock.lock() else {
            return CacheData::default();
        };
        std::fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    fn write(&self, data: &CacheData) {
        let Ok(_guard) = self.lock.lock() else {
            return;
        };
        match serde_json::to_vec_pretty(data) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.path, bytes) {
                    tracing::warn!(path = %self.path.display(), error = %e, "cache write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "cache serialization failed"),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut CacheData)) {
        let mut data = self.read();
        apply(&mut data);
        self.write(&data);
    }
}

impl LocalCache for JsonFileCache {
    fn load_cart(&self) -> Vec<CartItem> {
        self.read().cart
    }

    fn store_cart(&self, items: &[CartItem]) {
        self.update(|d| d.cart = items.to_vec());
    }

    fn load_products(&self) -> Vec<ProductSnapshot> {
        self.read().products
    }

    fn store_products(&self, products: &[ProductSnapshot]) {
        self.update(|d| d.products = products.to_vec());
    }

    fn load_session(&self) -> Option<Session> {
        self.read().session
    }

    fn store_session(&self, session: Option<&Session>) {
        self.update(|d| d.session = session.cloned());
    }

    fn load_orders(&self) -> Vec<serde_json::Value> {
        self.read().orders
    }

    fn push_order(&self, order: &serde_json::Value) {
        self.update(|d| d.orders.insert(0, order.clone()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, quantity: u32) -> CartItem {
        CartItem::new(ProductId::new(id), quantity, None)
    }

    #[test]
    fn test_memory_cache_cart_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.load_cart().is_empty());

        cache.store_cart(&[item(7, 2)]);
        let cart = cache.load_cart();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().unwrap().quantity, 2);
    }

    #[test]
    fn test_memory_cache_session_roundtrip() {
        let cache = MemoryCache::new();
        let session = Session {
            phone: Phone::parse("0912345678").unwrap(),
            full_name: "Nguyễn Văn A".to_owned(),
            token: "jwt".to_owned(),
        };

        cache.store_session(Some(&session));
        assert_eq!(cache.load_session(), Some(session));

        cache.store_session(None);
        assert!(cache.load_session().is_none());
    }

    #[test]
    fn test_memory_cache_orders_newest_first() {
        let cache = MemoryCache::new();
        cache.push_order(&json!({"id": "DH1"}));
        cache.push_order(&json!({"id": "DH2"}));

        let orders = cache.load_orders();
        assert_eq!(orders.first().unwrap()["id"], "DH2");
    }

    #[test]
    fn test_file_cache_survives_reopen() {
        let path = std::env::temp_dir().join("bepviet-client-cache-test.json");
        let _ = std::fs::remove_file(&path);

        {
            let cache = JsonFileCache::new(&path);
            cache.store_cart(&[item(7, 3)]);
            cache.store_products(&[ProductSnapshot {
                id: ProductId::new(7),
                title: "Cơm gà".to_owned(),
                price: Price::new(45_000),
            }]);
        }

        let reopened = JsonFileCache::new(&path);
        assert_eq!(reopened.load_cart().first().unwrap().quantity, 3);
        assert_eq!(reopened.load_products().len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_cache_missing_file_is_empty() {
        let cache = JsonFileCache::new("/nonexistent/dir/cache.json");
        assert!(cache.load_cart().is_empty());
        assert!(cache.load_session().is_none());
    }
}

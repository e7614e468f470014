//! Application state shared across handlers.

use std::sync::Arc;

use crate::cart::CartStore;
use crate::catalog::{CatalogClient, PriceSource, ProductCatalog};
use crate::config::ServicesConfig;
use crate::orders::OrderStore;
use crate::users::UserDirectory;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the per-service repositories.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServicesConfig,
    carts: CartStore,
    catalog: ProductCatalog,
    users: UserDirectory,
    orders: OrderStore,
    price_source: PriceSource,
}

impl AppState {
    /// Create a new application state.
    ///
    /// With `catalog_url` set, the order service resolves prices over HTTP
    /// (split deployment); otherwise it reads the in-process catalog.
    #[must_use]
    pub fn new(config: ServicesConfig) -> Self {
        let catalog = ProductCatalog::new();
        let price_source = match &config.catalog_url {
            Some(url) => PriceSource::Remote(CatalogClient::new(url)),
            None => PriceSource::Local(catalog.clone()),
        };
        let carts = CartStore::new(config.cart_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                carts,
                catalog,
                users: UserDirectory::new(),
                orders: OrderStore::new(),
                price_source,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ServicesConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the user directory.
    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.inner.users
    }

    /// Get a reference to the order store.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    /// Get a reference to the order service's price source.
    #[must_use]
    pub fn price_source(&self) -> &PriceSource {
        &self.inner.price_source
    }
}

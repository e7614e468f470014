//! Product catalog.
//!
//! Read-mostly collection of menu products. The ordering flow only reads
//! prices (and optionally adjusts inventory, see
//! [`crate::config::InventoryPolicy`]); creation and editing belong to an
//! administrative actor.

pub mod client;
pub mod routes;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use bepviet_core::{Price, ProductCategory, ProductId, ProductStatus};

use crate::error::{ApiError, Result};

pub use client::CatalogClient;

/// A menu product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub category: ProductCategory,
    pub price: Price,
    #[serde(rename = "img")]
    pub image: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub status: ProductStatus,
    pub inventory: u32,
    pub sold: u32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Fields for a new product; ids are assigned by the catalog.
#[derive(Debug, Clone)]
pub struct ProductSpec {
    pub title: String,
    pub category: ProductCategory,
    pub price: Price,
    pub image: String,
    pub description: String,
    pub inventory: u32,
}

/// Partial update applied to an existing product.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Price>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProductStatus>,
    pub inventory: Option<u32>,
}

/// Whether an inventory adjustment adds or removes stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InventoryOp {
    #[default]
    Decrease,
    Increase,
}

/// Listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Exact category label.
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
    pub sort_by: SortField,
    pub descending: bool,
}

/// Listing sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
    Sold,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "sold" => Ok(Self::Sold),
            other => Err(format!("invalid sort field: {other}")),
        }
    }
}

/// In-process product repository.
#[derive(Clone)]
pub struct ProductCatalog {
    inner: Arc<RwLock<CatalogInner>>,
}

struct CatalogInner {
    products: BTreeMap<ProductId, Product>,
    next_id: i64,
}

impl ProductCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CatalogInner {
                products: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Insert a product, assigning the next id.
    pub async fn insert(&self, spec: ProductSpec) -> Product {
        let mut inner = self.inner.write().await;
        let id = ProductId::new(inner.next_id);
        inner.next_id += 1;

        let product = Product {
            id,
            title: spec.title,
            category: spec.category,
            price: spec.price,
            image: spec.image,
            description: spec.description,
            status: ProductStatus::Active,
            inventory: spec.inventory,
            sold: 0,
            created_at: Utc::now(),
        };
        inner.products.insert(id, product.clone());
        product
    }

    /// Look up a product by id.
    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.inner.read().await.products.get(&id).cloned()
    }

    /// The unit price of a product, if it exists.
    pub async fn unit_price(&self, id: ProductId) -> Option<Price> {
        self.inner.read().await.products.get(&id).map(|p| p.price)
    }

    /// Filtered, sorted listing (pagination is the caller's concern).
    pub async fn list(&self, filter: &ProductFilter) -> Vec<Product> {
        let inner = self.inner.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);

        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| p.category.label() == c)
            })
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                needle.as_deref().is_none_or(|n| {
                    p.title.to_lowercase().contains(n) || p.description.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();

        products.sort_by(|a, b| {
            let ord = match filter.sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
                SortField::Price => a.price.cmp(&b.price),
                SortField::Sold => a.sold.cmp(&b.sold),
            };
            if filter.descending { ord.reverse() } else { ord }
        });
        products
    }

    /// Distinct category labels among active products, in menu order.
    pub async fn categories(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        ProductCategory::ALL
            .into_iter()
            .filter(|c| {
                inner
                    .products
                    .values()
                    .any(|p| p.status == ProductStatus::Active && p.category == *c)
            })
            .map(|c| c.label().to_owned())
            .collect()
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the product doesn't exist.
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

        if let Some(title) = patch.title {
            product.title = title;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image) = patch.image {
            product.image = image;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(status) = patch.status {
            product.status = status;
        }
        if let Some(inventory) = patch.inventory {
            product.inventory = inventory;
        }

        Ok(product.clone())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))
    }

    /// Adjust inventory, keeping the `sold` counter in sync.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown product and a validation error when
    /// decreasing below zero stock.
    pub async fn adjust_inventory(
        &self,
        id: ProductId,
        quantity: u32,
        op: InventoryOp,
    ) -> Result<Product> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("Product not found".to_owned()))?;

        match op {
            InventoryOp::Decrease => {
                if product.inventory < quantity {
                    return Err(ApiError::Validation("Insufficient inventory".to_owned()));
                }
                product.inventory -= quantity;
                product.sold = product.sold.saturating_add(quantity);
            }
            InventoryOp::Increase => {
                product.inventory = product.inventory.saturating_add(quantity);
                product.sold = product.sold.saturating_sub(quantity);
            }
        }

        Ok(product.clone())
    }
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Price (and inventory) lookups as seen from the order service.
///
/// `Local` shares the in-process catalog; `Remote` goes through HTTP when the
/// order service is deployed apart from the catalog.
#[derive(Clone)]
pub enum PriceSource {
    Local(ProductCatalog),
    Remote(CatalogClient),
}

impl PriceSource {
    /// Resolve a product's unit price; `Ok(None)` when the product is
    /// unknown, `Err` when the catalog could not be reached.
    pub async fn unit_price(&self, id: ProductId) -> Result<Option<Price>> {
        match self {
            Self::Local(catalog) => Ok(catalog.unit_price(id).await),
            Self::Remote(client) => client.unit_price(id).await,
        }
    }

    /// Decrement stock for a fulfilled line.
    pub async fn decrease_inventory(&self, id: ProductId, quantity: u32) -> Result<()> {
        match self {
            Self::Local(catalog) => catalog
                .adjust_inventory(id, quantity, InventoryOp::Decrease)
                .await
                .map(|_| ()),
            Self::Remote(client) => client.decrease_inventory(id, quantity).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spec(title: &str, category: ProductCategory, price: u64) -> ProductSpec {
        ProductSpec {
            title: title.to_owned(),
            category,
            price: Price::new(price),
            image: "img/placeholder.png".to_owned(),
            description: "một món ăn ngon của quán".to_owned(),
            inventory: 10,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let catalog = ProductCatalog::new();
        let a = catalog
            .insert(spec("Cơm gà", ProductCategory::Savory, 45_000))
            .await;
        let b = catalog
            .insert(spec("Chè bưởi", ProductCategory::Dessert, 20_000))
            .await;
        assert_eq!(a.id, ProductId::new(1));
        assert_eq!(b.id, ProductId::new(2));
    }

    #[tokio::test]
    async fn test_list_filters_by_category_and_search() {
        let catalog = ProductCatalog::new();
        catalog
            .insert(spec("Cơm gà xối mỡ", ProductCategory::Savory, 45_000))
            .await;
        catalog
            .insert(spec("Lẩu thái", ProductCategory::Hotpot, 150_000))
            .await;

        let filter = ProductFilter {
            category: Some("Món lẩu".to_owned()),
            ..Default::default()
        };
        let hotpot = catalog.list(&filter).await;
        assert_eq!(hotpot.len(), 1);
        assert_eq!(hotpot.first().unwrap().title, "Lẩu thái");

        let filter = ProductFilter {
            search: Some("CƠM".to_owned()),
            ..Default::default()
        };
        let rice = catalog.list(&filter).await;
        assert_eq!(rice.len(), 1);
    }

    #[tokio::test]
    async fn test_list_hides_by_status_filter() {
        let catalog = ProductCatalog::new();
        let p = catalog
            .insert(spec("Cơm gà", ProductCategory::Savory, 45_000))
            .await;
        catalog
            .update(
                p.id,
                ProductPatch {
                    status: Some(ProductStatus::Hidden),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let filter = ProductFilter {
            status: Some(ProductStatus::Active),
            ..Default::default()
        };
        assert!(catalog.list(&filter).await.is_empty());
    }

    #[tokio::test]
    async fn test_sort_by_price() {
        let catalog = ProductCatalog::new();
        catalog
            .insert(spec("Đắt", ProductCategory::Savory, 90_000))
            .await;
        catalog
            .insert(spec("Rẻ", ProductCategory::Savory, 10_000))
            .await;

        let filter = ProductFilter {
            sort_by: SortField::Price,
            descending: false,
            ..Default::default()
        };
        let listed = catalog.list(&filter).await;
        assert_eq!(listed.first().unwrap().title, "Rẻ");
    }

    #[tokio::test]
    async fn test_inventory_decrease_guards() {
        let catalog = ProductCatalog::new();
        let p = catalog
            .insert(spec("Cơm gà", ProductCategory::Savory, 45_000))
            .await;

        let updated = catalog
            .adjust_inventory(p.id, 4, InventoryOp::Decrease)
            .await
            .unwrap();
        assert_eq!(updated.inventory, 6);
        assert_eq!(updated.sold, 4);

        let err = catalog
            .adjust_inventory(p.id, 7, InventoryOp::Decrease)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_categories_lists_active_only() {
        let catalog = ProductCatalog::new();
        let p = catalog
            .insert(spec("Lẩu thái", ProductCategory::Hotpot, 150_000))
            .await;
        catalog
            .insert(spec("Chè bưởi", ProductCategory::Dessert, 20_000))
            .await;
        catalog
            .update(
                p.id,
                ProductPatch {
                    status: Some(ProductStatus::Hidden),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(catalog.categories().await, vec!["Món tráng miệng"]);
    }

    #[tokio::test]
    async fn test_price_source_local() {
        let catalog = ProductCatalog::new();
        let p = catalog
            .insert(spec("Cơm gà", ProductCategory::Savory, 45_000))
            .await;

        let source = PriceSource::Local(catalog);
        assert_eq!(
            source.unit_price(p.id).await.unwrap(),
            Some(Price::new(45_000))
        );
        assert_eq!(source.unit_price(ProductId::new(99)).await.unwrap(), None);
    }
}

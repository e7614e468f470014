//! Cart and order line items.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Note stored when the customer leaves the note field empty.
pub const DEFAULT_ITEM_NOTE: &str = "Không có ghi chú";

fn default_note() -> String {
    DEFAULT_ITEM_NOTE.to_owned()
}

/// A line in a cart: product, quantity, and preparation note.
///
/// The cart is a set keyed by `product_id`; the store merges duplicate ids by
/// summing quantities, so a cart never holds two lines for the same product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(rename = "soluong")]
    pub quantity: u32,
    #[serde(default = "default_note")]
    pub note: String,
}

impl CartItem {
    /// Create a line with the given quantity and an optional note.
    ///
    /// An empty or missing note is replaced by [`DEFAULT_ITEM_NOTE`].
    #[must_use]
    pub fn new(product_id: ProductId, quantity: u32, note: Option<String>) -> Self {
        let note = match note {
            Some(n) if !n.trim().is_empty() => n,
            _ => default_note(),
        };
        Self {
            product_id,
            quantity,
            note,
        }
    }
}

/// A line in a finalized order: a cart line plus the captured unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(rename = "soluong")]
    pub quantity: u32,
    /// Unit price at the time the order was placed.
    #[serde(rename = "price")]
    pub unit_price: Price,
    #[serde(default = "default_note")]
    pub note: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_note_defaults() {
        let item = CartItem::new(ProductId::new(7), 2, None);
        assert_eq!(item.note, DEFAULT_ITEM_NOTE);

        let item = CartItem::new(ProductId::new(7), 2, Some("  ".to_owned()));
        assert_eq!(item.note, DEFAULT_ITEM_NOTE);

        let item = CartItem::new(ProductId::new(7), 2, Some("ít cay".to_owned()));
        assert_eq!(item.note, "ít cay");
    }

    #[test]
    fn test_wire_field_names() {
        let item = CartItem::new(ProductId::new(7), 3, None);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["soluong"], 3);
        assert_eq!(json["note"], DEFAULT_ITEM_NOTE);
    }

    #[test]
    fn test_missing_note_deserializes_to_default() {
        let item: CartItem = serde_json::from_str(r#"{"id": 4, "soluong": 1}"#).unwrap();
        assert_eq!(item.note, DEFAULT_ITEM_NOTE);
    }

    #[test]
    fn test_order_item_wire_shape() {
        let json = r#"{"id": 2, "soluong": 2, "price": 10000, "note": "x"}"#;
        let item: OrderItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.unit_price, Price::new(10_000));
    }
}

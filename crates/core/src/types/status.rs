//! Status enums and wire vocabularies.
//!
//! The public API speaks integer status codes and Vietnamese wire strings,
//! so every enum here pins its serialized form explicitly.

use serde::{Deserialize, Serialize};

/// Order fulfillment status, serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum OrderStatus {
    /// Awaiting confirmation by the kitchen.
    #[default]
    Pending,
    /// Confirmed and fulfilled.
    Completed,
}

impl TryFrom<u8> for OrderStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::Completed),
            other => Err(format!("invalid order status: {other}")),
        }
    }
}

impl From<OrderStatus> for u8 {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => 0,
            OrderStatus::Completed => 1,
        }
    }
}

/// Account status, serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccountStatus {
    /// Blocked accounts cannot log in.
    Blocked,
    #[default]
    Active,
}

impl TryFrom<u8> for AccountStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Blocked),
            1 => Ok(Self::Active),
            other => Err(format!("invalid account status: {other}")),
        }
    }
}

impl From<AccountStatus> for u8 {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Blocked => 0,
            AccountStatus::Active => 1,
        }
    }
}

/// Account role, serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccountRole {
    #[default]
    Customer,
    Admin,
}

impl TryFrom<u8> for AccountRole {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Customer),
            1 => Ok(Self::Admin),
            other => Err(format!("invalid account role: {other}")),
        }
    }
}

impl From<AccountRole> for u8 {
    fn from(role: AccountRole) -> Self {
        match role {
            AccountRole::Customer => 0,
            AccountRole::Admin => 1,
        }
    }
}

/// Product visibility, serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProductStatus {
    /// Hidden from the storefront.
    Hidden,
    #[default]
    Active,
}

impl TryFrom<u8> for ProductStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Hidden),
            1 => Ok(Self::Active),
            other => Err(format!("invalid product status: {other}")),
        }
    }
}

impl From<ProductStatus> for u8 {
    fn from(status: ProductStatus) -> Self {
        match status {
            ProductStatus::Hidden => 0,
            ProductStatus::Active => 1,
        }
    }
}

/// Two-state exclusive delivery selector.
///
/// The wire strings are the customer-facing labels and are part of the API
/// contract, so they are pinned here rather than derived from variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// Delivered to the recipient address; adds the shipping surcharge.
    #[serde(rename = "Giao tận nơi")]
    Delivery,
    /// Picked up at a branch; no surcharge.
    #[serde(rename = "Tự đến lấy")]
    Pickup,
}

impl DeliveryMethod {
    /// Whether this method requires a recipient address.
    #[must_use]
    pub const fn requires_address(self) -> bool {
        matches!(self, Self::Delivery)
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivery => write!(f, "Giao tận nơi"),
            Self::Pickup => write!(f, "Tự đến lấy"),
        }
    }
}

/// The fixed set of menu categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Món mặn")]
    Savory,
    #[serde(rename = "Món chay")]
    Vegetarian,
    #[serde(rename = "Món lẩu")]
    Hotpot,
    #[serde(rename = "Món tráng miệng")]
    Dessert,
    #[serde(rename = "Món nướng")]
    Grilled,
    #[serde(rename = "Combo")]
    Combo,
}

impl ProductCategory {
    /// All categories, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Savory,
        Self::Vegetarian,
        Self::Hotpot,
        Self::Dessert,
        Self::Grilled,
        Self::Combo,
    ];

    /// The customer-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Savory => "Món mặn",
            Self::Vegetarian => "Món chay",
            Self::Hotpot => "Món lẩu",
            Self::Dessert => "Món tráng miệng",
            Self::Grilled => "Món nướng",
            Self::Combo => "Combo",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| format!("invalid product category: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_codes() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "0");
        assert_eq!(serde_json::to_string(&OrderStatus::Completed).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<OrderStatus>("1").unwrap(),
            OrderStatus::Completed
        );
        assert!(serde_json::from_str::<OrderStatus>("2").is_err());
    }

    #[test]
    fn test_delivery_method_wire_strings() {
        let json = serde_json::to_string(&DeliveryMethod::Delivery).unwrap();
        assert_eq!(json, "\"Giao tận nơi\"");

        let parsed: DeliveryMethod = serde_json::from_str("\"Tự đến lấy\"").unwrap();
        assert_eq!(parsed, DeliveryMethod::Pickup);

        assert!(serde_json::from_str::<DeliveryMethod>("\"ship\"").is_err());
    }

    #[test]
    fn test_delivery_method_requires_address() {
        assert!(DeliveryMethod::Delivery.requires_address());
        assert!(!DeliveryMethod::Pickup.requires_address());
    }

    #[test]
    fn test_category_from_str() {
        let cat: ProductCategory = "Món lẩu".parse().unwrap();
        assert_eq!(cat, ProductCategory::Hotpot);
        assert!("Pizza".parse::<ProductCategory>().is_err());
    }
}

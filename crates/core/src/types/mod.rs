//! Core type definitions.
//!
//! All types here are plain data: serde-serializable, no I/O.

pub mod cart;
pub mod id;
pub mod order;
pub mod phone;
pub mod price;
pub mod status;

pub use cart::{CartItem, DEFAULT_ITEM_NOTE, OrderItem};
pub use id::{ProductId, UserId};
pub use order::OrderId;
pub use phone::{Phone, PhoneError};
pub use price::{FALLBACK_UNIT_PRICE, Price, PriceError, SHIPPING_FEE};
pub use status::{
    AccountRole, AccountStatus, DeliveryMethod, OrderStatus, ProductCategory, ProductStatus,
};

//! Bep Viet checkout reconciler.
//!
//! The storefront has three views of the same cart: the in-memory list for
//! the current session, a persistent local cache that survives restarts, and
//! the remote cart store, authoritative when the user is signed in and the
//! service is reachable. This crate unifies them behind one
//! [`reconciler::CartSession`]: every mutation prefers the remote store and
//! falls back to local state when the cart tier is down, so the storefront
//! keeps working in degraded conditions at the cost of temporary divergence.
//!
//! Checkout is layered on top: [`checkout`] prices the reconciled cart
//! against a locally cached product snapshot, validates the delivery form,
//! submits the order through the gateway, and clears the cart exactly once
//! on success.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod checkout;
pub mod error;
pub mod reconciler;

pub use api::ApiClient;
pub use cache::{JsonFileCache, LocalCache, MemoryCache, ProductSnapshot, Session};
pub use checkout::{CheckoutForm, PlacedOrder, PriceQuote, quote};
pub use error::ClientError;
pub use reconciler::{CartSession, SyncState};

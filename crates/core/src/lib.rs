//! Bep Viet Core - Shared types library.
//!
//! This crate provides common types used across all Bep Viet components:
//! - `services` - Backend services (users, catalog, cart, orders)
//! - `gateway` - Public API gateway (authentication, proxying)
//! - `client` - Checkout reconciler library used by frontends
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, phones, prices, and statuses
//! - [`token`] - Bearer token claims and HS256 issue/verify helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod token;
pub mod types;

pub use types::*;

//! Bep Viet backend services as a library.
//!
//! Each service (users, catalog, cart, orders) builds its own axum `Router`
//! over a shared [`state::AppState`], so a deployment can serve them from one
//! process on separate ports or split them across hosts. The binary in
//! `main.rs` does the former; the integration tests boot them on ephemeral
//! ports.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod orders;
pub mod pagination;
pub mod state;
pub mod users;

//! Bep Viet API gateway as a library.
//!
//! The gateway is the single public entrypoint: it authenticates bearer
//! tokens, forwards the verified identity as headers, rate-limits by client
//! IP, and reverse-proxies to the backend services. It holds no state beyond
//! its configuration and an HTTP client.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod proxy;
pub mod rate_limit;

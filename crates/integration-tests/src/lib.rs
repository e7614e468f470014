//! Integration tests for Bep Viet.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bepviet-integration-tests
//! ```
//!
//! Each [`TestContext`] boots the four backend services and the gateway on
//! ephemeral localhost ports, so tests exercise the same network path a
//! browser would: client -> gateway -> service.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;

use axum::Router;

use bepviet_client::ApiClient;
use bepviet_core::{Phone, Price};
use bepviet_gateway::config::{GatewayConfig, ServiceMap};
use bepviet_gateway::proxy::{GatewayState, router as gateway_router};
use bepviet_gateway::rate_limit::gateway_rate_limiter;
use bepviet_services::catalog::{Product, ProductSpec};
use bepviet_services::config::ServicesConfig;
use bepviet_services::state::AppState;
use bepviet_services::{cart, catalog, orders, users};

/// A running deployment: four services plus the gateway, all on ephemeral
/// ports, sharing one [`AppState`].
pub struct TestContext {
    /// Gateway base URL, e.g. `http://127.0.0.1:49152`.
    pub gateway_url: String,
    /// Direct handle to the backing stores for seeding and inspection.
    pub state: AppState,
    /// Raw HTTP client for endpoint-level assertions.
    pub http: reqwest::Client,
}

impl TestContext {
    /// Boot everything.
    pub async fn new() -> Self {
        let config = ServicesConfig::default();
        let state = AppState::new(config.clone());

        let users_addr = spawn(users::routes::router().with_state(state.clone())).await;
        let products_addr = spawn(catalog::routes::router().with_state(state.clone())).await;
        let cart_addr = spawn(cart::routes::router().with_state(state.clone())).await;
        let orders_addr = spawn(orders::routes::router().with_state(state.clone())).await;

        let gateway_config = GatewayConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            jwt_secret: config.jwt_secret.clone(),
            services: ServiceMap {
                users: format!("http://{users_addr}"),
                products: format!("http://{products_addr}"),
                cart: format!("http://{cart_addr}"),
                orders: format!("http://{orders_addr}"),
            },
        };

        let gateway = gateway_router(GatewayState::new(gateway_config)).layer(gateway_rate_limiter());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                gateway.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            gateway_url: format!("http://{gateway_addr}"),
            state,
            http: reqwest::Client::new(),
        }
    }

    /// An [`ApiClient`] pointed at the gateway.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        ApiClient::new(&self.gateway_url)
    }

    /// Seed a product directly into the catalog.
    pub async fn seed_product(&self, title: &str, price: u64) -> Product {
        self.state
            .catalog()
            .insert(ProductSpec {
                title: title.to_owned(),
                category: bepviet_core::ProductCategory::Savory,
                price: Price::new(price),
                image: "img/placeholder.png".to_owned(),
                description: "một món ăn ngon của quán".to_owned(),
                inventory: 100,
            })
            .await
    }

    /// Register a customer through the gateway; returns its API client (with
    /// token attached) and phone.
    pub async fn register_customer(&self, phone: &str) -> (ApiClient, Phone) {
        let api = self.api();
        api.register("Nguyễn Văn A", phone, "matkhau123", None, None)
            .await
            .unwrap();
        (api, Phone::parse(phone).unwrap())
    }

    /// Register an account, promote it to admin, and log in again so the
    /// token carries the admin role.
    pub async fn register_admin(&self, phone: &str) -> ApiClient {
        let api = self.api();
        api.register("Quản Trị Viên", phone, "matkhau123", None, None)
            .await
            .unwrap();
        self.state
            .users()
            .promote_to_admin(&Phone::parse(phone).unwrap())
            .await
            .unwrap();
        api.login(phone, "matkhau123").await.unwrap();
        api
    }

    /// The gateway URL for a path, for raw reqwest calls.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.gateway_url)
    }
}

/// Bind an ephemeral listener and serve the router on it.
async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

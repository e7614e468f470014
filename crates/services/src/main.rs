//! Bep Viet backend services binary.
//!
//! Serves the user directory, product catalog, cart store, and order store,
//! each on its own port, so a deployment can run them together or start one
//! service per process:
//!
//! ```bash
//! # Everything in one process
//! bepviet-services
//!
//! # One service per process
//! bepviet-services cart
//! bepviet-services orders
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use axum::Router;
use clap::{Parser, ValueEnum};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bepviet_services::config::ServicesConfig;
use bepviet_services::state::AppState;
use bepviet_services::{cart, catalog, orders, users};

#[derive(Parser)]
#[command(name = "bepviet-services")]
#[command(author, version, about = "Bep Viet backend services")]
struct Cli {
    /// Services to run; defaults to all of them.
    #[arg(value_enum)]
    services: Vec<Service>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Service {
    Users,
    Catalog,
    Cart,
    Orders,
}

impl Service {
    const ALL: [Self; 4] = [Self::Users, Self::Catalog, Self::Cart, Self::Orders];

    fn router(self) -> Router<AppState> {
        match self {
            Self::Users => users::routes::router(),
            Self::Catalog => catalog::routes::router(),
            Self::Cart => cart::routes::router(),
            Self::Orders => orders::routes::router(),
        }
    }

    const fn addr(self, config: &ServicesConfig) -> SocketAddr {
        match self {
            Self::Users => config.user_addr(),
            Self::Catalog => config.product_addr(),
            Self::Cart => config.cart_addr(),
            Self::Orders => config.order_addr(),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Catalog => "catalog",
            Self::Cart => "cart",
            Self::Orders => "orders",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with EnvFilter.
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bepviet_services=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServicesConfig::from_env().expect("Failed to load configuration");
    let state = AppState::new(config.clone());

    let selected = if cli.services.is_empty() {
        Service::ALL.to_vec()
    } else {
        cli.services
    };

    let mut servers = Vec::with_capacity(selected.len());
    for service in selected {
        let addr = service.addr(&config);
        let app = service
            .router()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind to address");
        tracing::info!(service = service.name(), %addr, "service listening");

        servers.push(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .expect("Server error");
        }));
    }

    for server in servers {
        server.await.expect("Server task panicked");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

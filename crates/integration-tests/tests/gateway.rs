//! Gateway routing, authentication, and failure mapping.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;

use serde_json::json;

use bepviet_gateway::config::{GatewayConfig, ServiceMap};
use bepviet_gateway::proxy::{GatewayState, router as gateway_router};
use bepviet_integration_tests::TestContext;

#[tokio::test]
async fn health_reports_service_map() {
    let ctx = TestContext::new().await;

    let body: serde_json::Value = ctx
        .http
        .get(ctx.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "OK");
    assert_eq!(body["services"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let ctx = TestContext::new().await;

    let response = ctx
        .http
        .get(ctx.url("/api/payments/txn"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn public_routes_skip_authentication() {
    let ctx = TestContext::new().await;
    ctx.seed_product("Cơm gà", 25_000).await;

    let response = ctx
        .http
        .get(ctx.url("/api/products"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn identity_headers_reach_the_backend() {
    let ctx = TestContext::new().await;
    let (api, _) = ctx.register_customer("0941111111").await;

    // /api/users/profile resolves the caller purely from the forwarded
    // identity headers; a working profile proves the gateway injected them.
    let token = api.login("0941111111", "matkhau123").await.unwrap().token;
    let body: serde_json::Value = ctx
        .http
        .get(ctx.url("/api/users/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["user"]["phone"], "0941111111");
}

#[tokio::test]
async fn downstream_outage_maps_to_503() {
    // A gateway whose cart service URL points at a dead port.
    let gateway_config = GatewayConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        jwt_secret: secrecy::SecretString::from("kP9!fQ2@xL7#mR4$wT8%vB3^nJ6&hD1*"),
        services: ServiceMap {
            users: "http://127.0.0.1:9".to_owned(),
            products: "http://127.0.0.1:9".to_owned(),
            cart: "http://127.0.0.1:9".to_owned(),
            orders: "http://127.0.0.1:9".to_owned(),
        },
    };

    let app = gateway_router(GatewayState::new(gateway_config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/api/products"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 503);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Service temporarily unavailable");
}

#[tokio::test]
async fn registration_conflict_maps_to_409() {
    let ctx = TestContext::new().await;
    ctx.register_customer("0941111112").await;

    let response = ctx
        .http
        .post(ctx.url("/api/users/register"))
        .json(&json!({
            "fullname": "Nguyễn Văn B",
            "phone": "0941111112",
            "password": "matkhau456",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn blocked_account_cannot_log_in() {
    let ctx = TestContext::new().await;
    let (_, phone) = ctx.register_customer("0941111113").await;

    ctx.state
        .users()
        .set_status(&phone, bepviet_core::AccountStatus::Blocked)
        .await
        .unwrap();

    let response = ctx
        .http
        .post(ctx.url("/api/users/login"))
        .json(&json!({ "phone": "0941111113", "password": "matkhau123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

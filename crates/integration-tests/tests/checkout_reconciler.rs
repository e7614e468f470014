//! End-to-end checkout through the client reconciler.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bepviet_client::{CartSession, CheckoutForm, LocalCache, MemoryCache, Session, SyncState};
use bepviet_core::{DeliveryMethod, Price};
use bepviet_integration_tests::TestContext;

fn form(method: DeliveryMethod) -> CheckoutForm {
    CheckoutForm {
        delivery_method: method,
        delivery_date: chrono_date(),
        delivery_slot: None,
        note: None,
        recipient_name: "Nguyễn Văn A".to_owned(),
        recipient_phone: "0912345678".to_owned(),
        recipient_address: Some("12 Lý Thường Kiệt".to_owned()),
    }
}

fn chrono_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
}

/// Sign a fresh reconciler session in as a newly registered customer.
async fn signed_in_session(ctx: &TestContext, phone: &str) -> (CartSession, Arc<MemoryCache>) {
    let api = ctx.api();
    let auth = api
        .register("Nguyễn Văn A", phone, "matkhau123", None, None)
        .await
        .unwrap();

    let cache = Arc::new(MemoryCache::new());
    let mut session = CartSession::new(api, cache.clone());
    session
        .sign_in(Session {
            phone: bepviet_core::Phone::parse(phone).unwrap(),
            full_name: "Nguyễn Văn A".to_owned(),
            token: auth.token,
        })
        .await;
    (session, cache)
}

#[tokio::test]
async fn full_checkout_clears_cart_exactly_once() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Cơm gà xối mỡ", 25_000).await;
    let (mut session, cache) = signed_in_session(&ctx, "0931111111").await;

    // Cache the product snapshot, as the storefront does at load time
    let snapshot = session.api().get_products(50).await.unwrap();
    cache.store_products(&snapshot);

    // Empty cart, add qty 1, then the same product qty 2: one merged line
    session.add_item(product.id, 1, None).await.unwrap();
    session.add_item(product.id, 2, None).await.unwrap();
    assert_eq!(session.state(), SyncState::Synced);
    assert_eq!(session.items().len(), 1);
    assert_eq!(session.item_count(), 3);

    // Pickup: 3 x 25 000, no surcharge
    let quote = session.price_quote(DeliveryMethod::Pickup).unwrap();
    assert_eq!(quote.total, Price::new(75_000));

    let placed = session
        .submit_order(&form(DeliveryMethod::Pickup))
        .await
        .unwrap();
    assert_eq!(placed.total, Price::new(75_000));
    assert!(placed.id.starts_with("DH"));

    // The cart is gone everywhere: session, local cache, and the cart store
    assert!(session.items().is_empty());
    assert!(cache.load_cart().is_empty());
    let remote = session.api().get_cart("0931111111").await.unwrap();
    assert!(remote.is_empty());

    // The order landed in the buffered local history
    let history = cache.load_orders();
    assert_eq!(history.len(), 1);
    assert_eq!(history.first().unwrap()["tongtien"], 75_000);
}

#[tokio::test]
async fn order_history_prefers_remote_and_falls_back_to_buffer() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Cơm gà", 25_000).await;
    let (mut session, cache) = signed_in_session(&ctx, "0931111116").await;

    let snapshot = session.api().get_products(50).await.unwrap();
    cache.store_products(&snapshot);
    session.add_item(product.id, 1, None).await.unwrap();
    session
        .submit_order(&form(DeliveryMethod::Pickup))
        .await
        .unwrap();

    // Remote history serves the placed order
    let history = session.order_history(1, 10).await;
    assert_eq!(history.len(), 1);

    // With the gateway gone, the locally buffered copy still answers
    let offline = CartSession::new(
        bepviet_client::ApiClient::new("http://127.0.0.1:9"),
        cache.clone(),
    );
    let buffered = offline.order_history(1, 10).await;
    assert_eq!(buffered.len(), 1);
}

#[tokio::test]
async fn delivery_toggle_recomputes_total_without_refetch() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Lẩu thái", 150_000).await;
    let (mut session, cache) = signed_in_session(&ctx, "0931111112").await;

    let snapshot = session.api().get_products(50).await.unwrap();
    cache.store_products(&snapshot);
    session.add_item(product.id, 1, None).await.unwrap();

    let delivery = session.price_quote(DeliveryMethod::Delivery).unwrap();
    let pickup = session.price_quote(DeliveryMethod::Pickup).unwrap();

    assert_eq!(delivery.total, Price::new(180_000));
    assert_eq!(pickup.total, Price::new(150_000));
}

#[tokio::test]
async fn failed_submission_preserves_cart() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Cơm gà", 25_000).await;
    let (mut session, _cache) = signed_in_session(&ctx, "0931111113").await;

    session.add_item(product.id, 2, None).await.unwrap();

    // Invalid recipient phone fails client-side; nothing is submitted
    let mut bad_form = form(DeliveryMethod::Pickup);
    bad_form.recipient_phone = "12345".to_owned();
    assert!(session.submit_order(&bad_form).await.is_err());
    assert_eq!(session.item_count(), 2);

    // Delivery without an address also fails client-side
    let mut bad_form = form(DeliveryMethod::Delivery);
    bad_form.recipient_address = None;
    assert!(session.submit_order(&bad_form).await.is_err());
    assert_eq!(session.item_count(), 2);
}

#[tokio::test]
async fn unreachable_cart_tier_falls_back_to_local_cache() {
    // A session signed in against a gateway nothing listens on: every cart
    // call is a transport error.
    let cache = Arc::new(MemoryCache::new());
    cache.store_session(Some(&Session {
        phone: bepviet_core::Phone::parse("0931111114").unwrap(),
        full_name: "Nguyễn Văn A".to_owned(),
        token: "stale-token".to_owned(),
    }));
    let api = bepviet_client::ApiClient::new("http://127.0.0.1:9");
    let mut session = CartSession::new(api, cache.clone());

    session
        .add_item(bepviet_core::ProductId::new(7), 1, None)
        .await
        .unwrap();

    assert_eq!(session.state(), SyncState::Stale);
    assert_eq!(session.item_count(), 1);
    assert_eq!(cache.load_cart().len(), 1);

    // A later refresh against the still-dead tier keeps the local view
    session.refresh().await;
    assert_eq!(session.state(), SyncState::Stale);
    assert_eq!(session.item_count(), 1);
}

#[tokio::test]
async fn stale_session_resyncs_against_live_gateway() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Cơm gà", 25_000).await;
    let (mut session, _cache) = signed_in_session(&ctx, "0931111115").await;

    session.add_item(product.id, 2, None).await.unwrap();
    assert_eq!(session.state(), SyncState::Synced);

    session.refresh().await;
    assert_eq!(session.state(), SyncState::Synced);
    assert_eq!(session.item_count(), 2);
}

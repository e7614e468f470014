//! Product catalog behavior through the gateway.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use bepviet_integration_tests::TestContext;

#[tokio::test]
async fn listing_paginates_and_searches() {
    let ctx = TestContext::new().await;
    for i in 1_u64..=15 {
        ctx.seed_product(&format!("Món ăn số {i}"), 10_000 * i).await;
    }
    ctx.seed_product("Lẩu thái đặc biệt", 200_000).await;

    let body: serde_json::Value = ctx
        .http
        .get(ctx.url("/api/products?page=2&limit=12"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 4);
    assert_eq!(body["pagination"]["total"], 16);
    assert_eq!(body["pagination"]["pages"], 2);

    let body: serde_json::Value = ctx
        .http
        .get(ctx.url("/api/products"))
        .query(&[("search", "lẩu thái")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn get_by_id_and_missing_product() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Cơm gà", 45_000).await;

    let body: serde_json::Value = ctx
        .http
        .get(ctx.url(&format!("/api/products/{}", product.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["product"]["title"], "Cơm gà");
    assert_eq!(body["product"]["price"], 45_000);

    let response = ctx
        .http
        .get(ctx.url("/api/products/999"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn categories_list_active_products() {
    let ctx = TestContext::new().await;
    ctx.seed_product("Cơm gà", 45_000).await;

    let body: serde_json::Value = ctx
        .http
        .get(ctx.url("/api/products/categories/list"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["categories"], json!(["Món mặn"]));
}

#[tokio::test]
async fn inventory_decrease_guards_stock() {
    let ctx = TestContext::new().await;
    let product = ctx.seed_product("Cơm gà", 45_000).await;

    let body: serde_json::Value = ctx
        .http
        .patch(ctx.url(&format!("/api/products/{}/inventory", product.id)))
        .json(&json!({ "quantity": 30, "operation": "decrease" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["product"]["inventory"], 70);
    assert_eq!(body["product"]["sold"], 30);

    let response = ctx
        .http
        .patch(ctx.url(&format!("/api/products/{}/inventory", product.id)))
        .json(&json!({ "quantity": 90, "operation": "decrease" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn create_product_validates_fields() {
    let ctx = TestContext::new().await;

    let response = ctx
        .http
        .post(ctx.url("/api/products"))
        .json(&json!({
            "title": "ab",
            "category": "Món mặn",
            "price": 10_000,
            "img": "img/x.png",
            "desc": "mô tả đủ dài cho món ăn",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = ctx
        .http
        .post(ctx.url("/api/products"))
        .json(&json!({
            "title": "Bún chả",
            "category": "Món mặn",
            "price": 40_000,
            "img": "img/buncha.png",
            "desc": "mô tả đủ dài cho món ăn",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
}

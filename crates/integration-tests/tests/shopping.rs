//! Integration tests for cart, wishlist and checkout.
//!
//! These tests require:
//! - A running storefront server (`cargo run -p kanak-storefront`)
//! - A seeded catalog with at least one product in stock
//! - Admin credentials for the exchange-credit test (see the crate docs)
//!
//! Run with: cargo test -p kanak-integration-tests -- --ignored

use kanak_integration_tests::{admin, any_product, create_product, customer, expect_json, url};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

async fn add_to_cart(client: &Client, product: &Value, quantity: i32) -> Value {
    let resp = client
        .post(url("/api/cart"))
        .json(&json!({ "product_id": product["id"], "quantity": quantity }))
        .send()
        .await
        .expect("Failed to add to cart");
    expect_json(resp, StatusCode::OK).await
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_catalog_listing() {
    let resp = reqwest::Client::new()
        .get(url("/api/products?per_page=500&page=0"))
        .send()
        .await
        .expect("request");
    let page = expect_json(resp, StatusCode::OK).await;

    assert_eq!(page["page"], 1);
    assert_eq!(page["per_page"], 60);
    assert!(page["total"].as_i64().is_some());

    let resp = reqwest::Client::new()
        .get(url("/api/products/no-such-product"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_cart_requires_login() {
    let resp = reqwest::Client::new()
        .get(url("/api/cart"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_cart_quantity_never_below_one() {
    let (client, _) = customer().await;
    let product = any_product(&client).await;

    let cart = add_to_cart(&client, &product, 1).await;
    let item_id = cart["items"][0]["id"].clone();

    let resp = client
        .patch(url(&format!("/api/cart/{item_id}")))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("request");
    let cart = expect_json(resp, StatusCode::OK).await;
    assert_eq!(cart["items"][0]["quantity"], 1);

    let resp = client.delete(url("/api/cart")).send().await.expect("request");
    let cart = expect_json(resp, StatusCode::OK).await;
    assert_eq!(cart["items"], json!([]));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_wishlist_move_to_cart() {
    let (client, _) = customer().await;
    let product = any_product(&client).await;
    let product_id = &product["id"];

    let resp = client
        .post(url("/api/wishlist"))
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(url("/api/wishlist"))
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK, "second add is idempotent");

    let resp = client
        .post(url(&format!("/api/wishlist/{product_id}/move-to-cart")))
        .send()
        .await
        .expect("request");
    let cart = expect_json(resp, StatusCode::OK).await;
    assert_eq!(cart["items"][0]["product_id"], *product_id);

    let resp = client.get(url("/api/wishlist")).send().await.expect("request");
    let wishlist = expect_json(resp, StatusCode::OK).await;
    assert_eq!(wishlist, json!([]));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_checkout_and_cancel() {
    let (client, _) = customer().await;
    let product = any_product(&client).await;
    add_to_cart(&client, &product, 1).await;

    let resp = client
        .post(url("/api/checkout/quote"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    let quote = expect_json(resp, StatusCode::OK).await;
    assert_eq!(quote["item_count"], 1);

    let resp = client
        .post(url("/api/orders"))
        .json(&json!({
            "shipping_address": "12 MG Road, Jaipur 302001",
            "phone": "+91 98290 00000",
            "payment_method": "upi",
        }))
        .send()
        .await
        .expect("request");
    let order = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"], quote["total"]);

    let resp = client.get(url("/api/cart")).send().await.expect("request");
    let cart = expect_json(resp, StatusCode::OK).await;
    assert_eq!(cart["items"], json!([]), "placing an order empties the cart");

    let order_id = &order["id"];
    let resp = client
        .post(url(&format!("/api/orders/{order_id}/cancel")))
        .send()
        .await
        .expect("request");
    let cancelled = expect_json(resp, StatusCode::OK).await;
    assert_eq!(cancelled["status"], "cancelled");

    let resp = client
        .post(url(&format!("/api/orders/{order_id}/cancel")))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_empty_cart_cannot_check_out() {
    let (client, _) = customer().await;
    let resp = client
        .post(url("/api/orders"))
        .json(&json!({
            "shipping_address": "12 MG Road, Jaipur 302001",
            "phone": "+91 98290 00000",
            "payment_method": "card",
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

fn money(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("money is a decimal string")
}

async fn quote_with_credit(client: &Client, exchange_request_id: &Value) -> reqwest::Response {
    client
        .post(url("/api/checkout/quote"))
        .json(&json!({ "exchange_request_id": exchange_request_id }))
        .send()
        .await
        .expect("request")
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_exchange_credit_is_capped_spent_once_and_released() {
    let admin = admin().await;
    let resp = admin
        .post(url("/api/admin/market-rates"))
        .json(&json!({ "metal": "gold", "purity": "k22", "rate_per_gram": "6650.00" }))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::CREATED).await;
    let product = create_product(&admin, "1000.00", 5).await;

    let (client, _) = customer().await;
    let resp = client
        .post(url("/api/exchange/requests"))
        .json(&json!({
            "metal": "gold",
            "purity": "k22",
            "weight_grams": "10.000",
            "description": "Old mangalsutra",
        }))
        .send()
        .await
        .expect("request");
    let request = expect_json(resp, StatusCode::CREATED).await;
    let exchange_id = request["id"].clone();

    add_to_cart(&client, &product, 1).await;
    let resp = quote_with_credit(&client, &exchange_id).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "pending credit can't be spent");

    let resp = admin
        .post(url(&format!("/api/admin/exchange/requests/{exchange_id}/approve")))
        .json(&json!({ "appraised_value": "58000.00" }))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::OK).await;

    let quote = expect_json(quote_with_credit(&client, &exchange_id).await, StatusCode::OK).await;
    let gross = money(&quote["subtotal"]) + money(&quote["shipping"]);
    assert_eq!(money(&quote["subtotal"]), Decimal::new(1000, 0));
    assert_eq!(money(&quote["exchange_discount"]), gross, "credit capped at the order value");
    assert_eq!(money(&quote["total"]), Decimal::ZERO);

    let resp = client
        .post(url("/api/orders"))
        .json(&json!({
            "shipping_address": "12 MG Road, Jaipur 302001",
            "phone": "+91 98290 00000",
            "payment_method": "upi",
            "exchange_request_id": exchange_id,
        }))
        .send()
        .await
        .expect("request");
    let order = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(money(&order["exchange_discount"]), gross);
    assert_eq!(money(&order["total"]), Decimal::ZERO);

    add_to_cart(&client, &product, 1).await;
    let resp = quote_with_credit(&client, &exchange_id).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "credit already redeemed");

    let order_id = &order["id"];
    let resp = client
        .post(url(&format!("/api/orders/{order_id}/cancel")))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::OK).await;

    let quote = expect_json(quote_with_credit(&client, &exchange_id).await, StatusCode::OK).await;
    assert_eq!(
        money(&quote["exchange_discount"]),
        money(&quote["subtotal"]) + money(&quote["shipping"]),
        "cancelling frees the credit"
    );
}

//! Integration tests for admin workflows: rates, exchange appraisal, stock,
//! partner reviews, Gullak savings and the day book.
//!
//! These tests require:
//! - A running storefront server (`cargo run -p kanak-storefront`)
//! - `KANAK_TEST_ADMIN_EMAIL` / `KANAK_TEST_ADMIN_PASSWORD` for an admin
//!   created with `kanak-cli admin create`
//!
//! Run with: cargo test -p kanak-integration-tests -- --ignored

use chrono::{Duration, Utc};
use kanak_integration_tests::{
    admin, create_product, customer, expect_json, log_in, unique_email, url,
};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn publish_rate(admin: &Client, metal: &str, purity: &str, rate: &str) -> Value {
    let resp = admin
        .post(url("/api/admin/market-rates"))
        .json(&json!({ "metal": metal, "purity": purity, "rate_per_gram": rate }))
        .send()
        .await
        .expect("Failed to publish rate");
    expect_json(resp, StatusCode::CREATED).await
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_published_rate_is_served_immediately() {
    let admin = admin().await;
    publish_rate(&admin, "gold", "k24", "7250.00").await;

    let resp = reqwest::Client::new()
        .get(url("/api/market-rates"))
        .send()
        .await
        .expect("request");
    let rates = expect_json(resp, StatusCode::OK).await;
    let k24 = rates
        .as_array()
        .and_then(|rates| rates.iter().find(|r| r["purity"] == "k24"))
        .expect("k24 rate listed");
    assert_eq!(k24["rate_per_gram"], "7250.00");
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_rate_purity_must_match_metal() {
    let admin = admin().await;
    let resp = admin
        .post(url("/api/admin/market-rates"))
        .json(&json!({ "metal": "silver", "purity": "k22", "rate_per_gram": "88.00" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_exchange_review_happens_once() {
    let admin = admin().await;
    publish_rate(&admin, "gold", "k22", "6650.00").await;

    let resp = reqwest::Client::new()
        .get(url("/api/exchange/estimate?metal=gold&purity=k22&weight_grams=10"))
        .send()
        .await
        .expect("request");
    let estimate = expect_json(resp, StatusCode::OK).await;
    assert_eq!(estimate["fineness"], "0.916");
    assert_eq!(estimate["metal_value"], "66500.00");

    let (client, _) = customer().await;
    let resp = client
        .post(url("/api/exchange/requests"))
        .json(&json!({
            "metal": "gold",
            "purity": "k22",
            "weight_grams": "10.000",
            "description": "Pair of old jhumkas",
        }))
        .send()
        .await
        .expect("request");
    let request = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(request["status"], "pending");
    let id = &request["id"];

    let resp = admin
        .post(url(&format!("/api/admin/exchange/requests/{id}/approve")))
        .json(&json!({ "appraised_value": "58000.00" }))
        .send()
        .await
        .expect("request");
    let approved = expect_json(resp, StatusCode::OK).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["appraised_value"], "58000.00");

    let resp = admin
        .post(url(&format!("/api/admin/exchange/requests/{id}/reject")))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

async fn stock_of(product: &Value) -> i64 {
    let slug = product["slug"].as_str().expect("product slug");
    let resp = reqwest::Client::new()
        .get(url(&format!("/api/products/{slug}")))
        .send()
        .await
        .expect("request");
    let product = expect_json(resp, StatusCode::OK).await;
    product["stock_quantity"].as_i64().expect("stock_quantity")
}

/// `(kind, quantity_delta)` for a product's movements, newest first.
async fn movements_of(admin: &Client, product: &Value) -> Vec<(String, i64)> {
    let id = &product["id"];
    let resp = admin
        .get(url(&format!("/api/admin/stock/movements?product_id={id}")))
        .send()
        .await
        .expect("request");
    let movements = expect_json(resp, StatusCode::OK).await;
    movements
        .as_array()
        .expect("movements listed")
        .iter()
        .map(|m| {
            (
                m["kind"].as_str().expect("kind").to_string(),
                m["quantity_delta"].as_i64().expect("delta"),
            )
        })
        .collect()
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_online_order_moves_stock_and_cancel_returns_it() {
    let admin = admin().await;
    let product = create_product(&admin, "1000.00", 3).await;

    let (client, _) = customer().await;
    let resp = client
        .post(url("/api/cart"))
        .json(&json!({ "product_id": product["id"], "quantity": 2 }))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::OK).await;

    let resp = client
        .post(url("/api/orders"))
        .json(&json!({
            "shipping_address": "4 Johari Bazaar, Jaipur 302003",
            "phone": "+91 98290 11111",
            "payment_method": "cash",
        }))
        .send()
        .await
        .expect("request");
    let order = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(stock_of(&product).await, 1);
    assert_eq!(
        movements_of(&admin, &product).await.first(),
        Some(&("online_sale".to_string(), -2))
    );

    let order_id = &order["id"];
    let resp = client
        .post(url(&format!("/api/orders/{order_id}/cancel")))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::OK).await;
    assert_eq!(stock_of(&product).await, 3);
    assert_eq!(
        movements_of(&admin, &product).await.first(),
        Some(&("return".to_string(), 2))
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_counter_sales_and_adjustments_cannot_oversell() {
    let admin = admin().await;
    let product = create_product(&admin, "2500.00", 3).await;

    let resp = admin
        .post(url("/api/admin/offline-sales"))
        .json(&json!({
            "product_id": product["id"],
            "quantity": 4,
            "payment_method": "cash",
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "more than in stock");

    let resp = admin
        .post(url("/api/admin/offline-sales"))
        .json(&json!({
            "product_id": product["id"],
            "quantity": 1,
            "payment_method": "upi",
        }))
        .send()
        .await
        .expect("request");
    let sale = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(sale["total"], "2500.00");
    assert_eq!(stock_of(&product).await, 2);
    assert_eq!(
        movements_of(&admin, &product).await.first(),
        Some(&("offline_sale".to_string(), -1))
    );

    let resp = admin
        .post(url("/api/admin/stock/movements"))
        .json(&json!({
            "product_id": product["id"],
            "kind": "adjustment",
            "quantity_delta": -3,
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "stock would go negative");

    let resp = admin
        .post(url("/api/admin/stock/movements"))
        .json(&json!({
            "product_id": product["id"],
            "kind": "adjustment",
            "quantity_delta": -2,
            "note": "damaged in polishing",
        }))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(stock_of(&product).await, 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_corporate_registration_reviewed_once() {
    let admin = admin().await;
    let resp = reqwest::Client::new()
        .post(url("/api/corporate/registrations"))
        .json(&json!({
            "company_name": "Test Textiles Pvt Ltd",
            "contact_name": "Meera Kulkarni",
            "email": unique_email("hr"),
            "phone": "+91 98200 00000",
            "employee_count": 120,
        }))
        .send()
        .await
        .expect("request");
    let registration = expect_json(resp, StatusCode::CREATED).await;
    let id = &registration["id"];

    let resp = admin
        .post(url(&format!("/api/admin/corporate/registrations/{id}/approve")))
        .json(&json!({ "discount_percent": "8.50" }))
        .send()
        .await
        .expect("request");
    let approved = expect_json(resp, StatusCode::OK).await;
    assert_eq!(approved["status"], "approved");

    let resp = admin
        .post(url(&format!("/api/admin/corporate/registrations/{id}/reject")))
        .json(&json!({ "note": "changed our mind" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_wholesaler_design_reviewed_once() {
    let admin = admin().await;
    let (client, user) = customer().await;

    let resp = client
        .post(url("/api/wholesaler/designs"))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN, "customers can't submit designs");

    let resp = admin
        .patch(url(&format!("/api/admin/users/{}/role", user["id"])))
        .json(&json!({ "role": "wholesaler" }))
        .send()
        .await
        .expect("request");
    expect_json(resp, StatusCode::OK).await;
    log_in(&client, user["email"].as_str().expect("email")).await;

    let resp = client
        .post(url("/api/wholesaler/designs"))
        .json(&json!({
            "title": "Kundan choker",
            "metal": "gold",
            "purity": "k22",
            "weight_grams": "38.500",
            "wholesale_price": "245000.00",
        }))
        .send()
        .await
        .expect("request");
    let design = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(design["status"], "pending");
    let id = &design["id"];

    let resp = admin
        .post(url(&format!("/api/admin/wholesaler/designs/{id}/reject")))
        .json(&json!({ "note": "too close to an existing line" }))
        .send()
        .await
        .expect("request");
    let rejected = expect_json(resp, StatusCode::OK).await;
    assert_eq!(rejected["status"], "rejected");

    let resp = admin
        .post(url(&format!("/api/admin/wholesaler/designs/{id}/approve")))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_gullak_payment_and_pause() {
    let admin = admin().await;
    publish_rate(&admin, "gold", "k22", "6650.00").await;

    let (client, _) = customer().await;
    let resp = client
        .post(url("/api/gullak/accounts"))
        .json(&json!({
            "metal": "gold",
            "purity": "k22",
            "target_grams": "10.000",
            "installment_amount": "5000.00",
            "frequency": "monthly",
        }))
        .send()
        .await
        .expect("request");
    let account = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(account["status"], "active");
    let id = &account["id"];

    let resp = client
        .post(url(&format!("/api/gullak/accounts/{id}/payments")))
        .json(&json!({ "amount": "5000.00" }))
        .send()
        .await
        .expect("request");
    let paid = expect_json(resp, StatusCode::CREATED).await;
    assert_eq!(paid["account"]["installments_paid"], 1);

    let resp = client
        .post(url(&format!("/api/gullak/accounts/{id}/pause")))
        .send()
        .await
        .expect("request");
    let paused = expect_json(resp, StatusCode::OK).await;
    assert_eq!(paused["status"], "paused");

    let resp = client
        .post(url(&format!("/api/gullak/accounts/{id}/payments")))
        .json(&json!({ "amount": "5000.00" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::CONFLICT, "paused plans take no payments");
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_gullak_rejects_past_start() {
    let (client, _) = customer().await;
    let yesterday = (Utc::now() - Duration::days(2)).date_naive();

    let resp = client
        .post(url("/api/gullak/accounts"))
        .json(&json!({
            "metal": "silver",
            "purity": "silver999",
            "target_grams": "100.000",
            "installment_amount": "1000.00",
            "frequency": "weekly",
            "start_date": yesterday,
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_daybook_totals_add_up() {
    let admin = admin().await;
    let resp = admin.get(url("/api/admin/daybook")).send().await.expect("request");
    let book = expect_json(resp, StatusCode::OK).await;

    let amount = |v: &Value| {
        v["amount"]
            .as_str()
            .and_then(|s| s.parse::<rust_decimal::Decimal>().ok())
            .expect("amount is a decimal string")
    };
    assert_eq!(amount(&book["total"]), amount(&book["online"]) + amount(&book["offline"]));

    let by_method: rust_decimal::Decimal = book["by_payment_method"]
        .as_array()
        .expect("methods listed")
        .iter()
        .map(amount)
        .sum();
    assert_eq!(by_method, amount(&book["total"]));
}

#[tokio::test]
#[ignore = "Requires running storefront server and admin credentials"]
async fn test_daybook_range_is_bounded() {
    let admin = admin().await;
    let resp = admin
        .get(url("/api/admin/daybook/range?from=2026-01-01&to=2026-12-31"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = admin
        .get(url("/api/admin/daybook/range?from=2026-03-01&to=2026-03-07"))
        .send()
        .await
        .expect("request");
    let books = expect_json(resp, StatusCode::OK).await;
    assert_eq!(books.as_array().map(Vec::len), Some(7));
}

//! Integration tests for account registration and sessions.
//!
//! These tests require a running server (`cargo run -p kanak-storefront`)
//! backed by a migrated database.

use kanak_integration_tests::{TEST_PASSWORD, client, customer, expect_json, unique_email, url};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client().get(url("/health")).send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client().get(url("/health/ready")).send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_logs_in() {
    let (client, user) = customer().await;
    assert_eq!(user["role"], "customer");

    let resp = client.get(url("/api/auth/me")).send().await.expect("request");
    let me = expect_json(resp, StatusCode::OK).await;
    assert_eq!(me["id"], user["id"]);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_email_conflicts() {
    let email = unique_email("dup");
    let body = json!({ "email": email, "password": TEST_PASSWORD, "name": "Dup" });

    let first = client()
        .post(url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .expect("request");
    assert_eq!(first.status(), StatusCode::CREATED);

    let again = client()
        .post(url("/api/auth/register"))
        .json(&json!({ "email": email.to_uppercase(), "password": TEST_PASSWORD, "name": "Dup" }))
        .send()
        .await
        .expect("request");
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_short_password_rejected() {
    let resp = client()
        .post(url("/api/auth/register"))
        .json(&json!({ "email": unique_email("weak"), "password": "short", "name": "Weak" }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_logout_ends_session() {
    let (client, _) = customer().await;

    let resp = client.post(url("/api/auth/logout")).send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(url("/api/auth/me")).send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_customers_cannot_reach_admin() {
    let (client, _) = customer().await;
    let resp = client.get(url("/api/admin/orders")).send().await.expect("request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = reqwest::Client::new()
        .get(url("/api/admin/orders"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

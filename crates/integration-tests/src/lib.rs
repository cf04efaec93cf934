//! Integration tests for the Kanak Jewels API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start Postgres, migrate, seed and run the server
//! cargo run -p kanak-cli -- migrate
//! cargo run -p kanak-cli -- seed catalog seed/catalog.yaml
//! cargo run -p kanak-storefront
//!
//! # Run everything, including tests that need the live server
//! cargo test -p kanak-integration-tests -- --include-ignored
//! ```
//!
//! # Environment Variables
//!
//! - `KANAK_TEST_BASE_URL` - Server under test (default `http://localhost:3000`)
//! - `KANAK_TEST_ADMIN_EMAIL` / `KANAK_TEST_ADMIN_PASSWORD` - An account
//!   created with `kanak-cli admin create`, used by back-office tests
//!
//! Tests that need a running server are `#[ignore]`d; tests of the shared
//! wire types always run.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::expect_used)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};

/// Password used for every throwaway account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("KANAK_TEST_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Absolute URL for an API path such as `/api/cart`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client that keeps the session cookie between requests.
///
/// Each client claims its own address in the 198.18.0.0/15 benchmarking
/// range, so per-IP rate limits don't trip across tests.
#[must_use]
pub fn client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&benchmark_ip()).expect("valid header"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

fn benchmark_ip() -> String {
    let [a, b, c, ..] = *uuid::Uuid::new_v4().as_bytes();
    format!("198.{}.{b}.{}", 18 + (a & 1), c.max(1))
}

/// A fresh address so reruns never collide on the unique email index.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.kanakjewels.in", uuid::Uuid::new_v4().simple())
}

/// Register a new customer; the returned client is logged in as them.
pub async fn customer() -> (Client, Value) {
    let client = client();
    let resp = client
        .post(url("/api/auth/register"))
        .json(&json!({
            "email": unique_email("customer"),
            "password": TEST_PASSWORD,
            "name": "Test Customer",
        }))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = resp.json().await.expect("Failed to parse user");
    (client, user)
}

/// Log in with the admin account named in the environment.
pub async fn admin() -> Client {
    let email = std::env::var("KANAK_TEST_ADMIN_EMAIL").expect("KANAK_TEST_ADMIN_EMAIL not set");
    let password =
        std::env::var("KANAK_TEST_ADMIN_PASSWORD").expect("KANAK_TEST_ADMIN_PASSWORD not set");

    let client = client();
    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), StatusCode::OK, "admin login failed");
    client
}

/// Assert the status and decode the JSON body.
pub async fn expect_json(resp: Response, status: StatusCode) -> Value {
    let actual = resp.status();
    let body = resp.text().await.expect("Failed to read response");
    assert_eq!(actual, status, "unexpected status, body: {body}");
    serde_json::from_str(&body).expect("Response is not JSON")
}

/// The first active product in the catalog, as JSON.
pub async fn any_product(client: &Client) -> Value {
    let resp = client
        .get(url("/api/products?per_page=1"))
        .send()
        .await
        .expect("Failed to list products");
    let page = expect_json(resp, StatusCode::OK).await;

    page["items"]
        .as_array()
        .and_then(|items| items.first())
        .cloned()
        .expect("catalog is empty; seed it first")
}

/// Create an active gold product priced at `price` with `stock` units,
/// filed under the first seeded category.
pub async fn create_product(admin: &Client, price: &str, stock: i32) -> Value {
    let resp = admin
        .get(url("/api/categories"))
        .send()
        .await
        .expect("Failed to list categories");
    let categories = expect_json(resp, StatusCode::OK).await;
    let category_id = categories
        .as_array()
        .and_then(|c| c.first())
        .map(|c| c["id"].clone())
        .expect("no categories; seed the catalog first");

    let slug = format!("test-ring-{}", uuid::Uuid::new_v4().simple());
    let resp = admin
        .post(url("/api/admin/products"))
        .json(&json!({
            "category_id": category_id,
            "name": "Test Ring",
            "slug": slug,
            "metal": "gold",
            "purity": "k22",
            "weight_grams": "2.500",
            "price": price,
            "stock_quantity": stock,
        }))
        .send()
        .await
        .expect("Failed to create product");
    expect_json(resp, StatusCode::CREATED).await
}

/// Log `client` in again, picking up a role change.
pub async fn log_in(client: &Client, email: &str) {
    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK, "login failed for {email}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_email_differs() {
        let a = unique_email("x");
        assert_ne!(a, unique_email("x"));
        assert!(kanak_core::Email::parse(&a).is_ok());
    }

    #[test]
    fn test_benchmark_ip_parses() {
        let ip: std::net::Ipv4Addr = benchmark_ip().parse().expect("ipv4");
        assert!(matches!(ip.octets(), [198, 18 | 19, _, _]));
    }

    #[test]
    fn test_url_joins_path() {
        assert!(url("/api/cart").ends_with("/api/cart"));
        assert!(!url("/api/cart").contains("//api"));
    }
}

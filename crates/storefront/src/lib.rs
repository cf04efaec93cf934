//! Kanak Jewels storefront library.
//!
//! The JSON API served by the `kanak-storefront` binary, exposed as a
//! library so the CLI can reuse the repositories and auth service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod assistant;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the complete application router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(session_layer)
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{StoreRules, StorefrontConfig};

    /// An app whose pool never connects. Enough for requests that are
    /// answered before any query runs.
    fn offline_app() -> Router {
        let url = "postgres://kanak@127.0.0.1:1/kanak";
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(url)
            .expect("lazy pool");
        let config = StorefrontConfig {
            database_url: SecretString::from(url),
            host: "127.0.0.1".parse().expect("ip"),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(64)),
            store: StoreRules::default(),
            claude: None,
            speech: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        app(AppState::new(config, pool).expect("state"))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn test_health_is_ok_without_database() {
        let resp = offline_app().oneshot(get("/health")).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_reports_database_down() {
        let resp = offline_app()
            .oneshot(get("/health/ready"))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_anonymous_requests_are_unauthorized() {
        for uri in ["/api/cart", "/api/wishlist", "/api/orders", "/api/admin/daybook"] {
            let resp = offline_app().oneshot(get(uri)).await.expect("response");
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_chat_without_provider_is_unavailable() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/chatbot/message")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(r#"{"messages":[{"role":"user","content":"Hi"}]}"#))
            .expect("request");

        let resp = offline_app().oneshot(request).await.expect("response");
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_oversized_amounts_are_bad_requests() {
        let huge = "79228162514264337593543950";
        for uri in [
            format!("/api/exchange/estimate?metal=gold&purity=k22&weight_grams={huge}"),
            format!(
                "/api/gullak/calculator?metal=gold&purity=k22&target_grams={huge}\
                 &installment_amount=2000&frequency=monthly"
            ),
            format!(
                "/api/gullak/calculator?metal=gold&purity=k22&target_grams=10\
                 &installment_amount={huge}&frequency=monthly"
            ),
        ] {
            let resp = offline_app().oneshot(get(&uri)).await.expect("response");
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let resp = offline_app()
            .oneshot(get("/api/no-such-thing"))
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

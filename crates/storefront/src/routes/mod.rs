//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST /api/auth/register, /api/auth/login, /api/auth/logout
//! GET  /api/auth/me
//!
//! # Catalog
//! GET  /api/categories
//! GET  /api/products               - Filtered, paginated listing
//! GET  /api/products/{slug}
//! GET  /api/market-rates
//! GET  /api/care-tutorials[/{slug}]
//!
//! # Shopping (requires login)
//! GET|POST|DELETE /api/cart, PATCH|DELETE /api/cart/{item_id}
//! GET|POST /api/wishlist, DELETE /api/wishlist/{product_id}
//! POST /api/wishlist/{product_id}/move-to-cart
//! POST /api/checkout/quote
//! GET|POST /api/orders, GET /api/orders/{id}, POST /api/orders/{id}/cancel
//!
//! # Exchange and Gullak
//! GET  /api/exchange/estimate
//! GET|POST /api/exchange/requests
//! GET  /api/gullak/calculator
//! GET|POST /api/gullak/accounts, GET /api/gullak/accounts/{id}
//! POST /api/gullak/accounts/{id}/payments|pause|resume
//!
//! # Partners
//! POST /api/corporate/registrations
//! GET|POST /api/wholesaler/designs  - Wholesalers only
//!
//! # Assistant (rate limited)
//! POST /api/chatbot/message|style|transcribe|speak
//!
//! # Back office
//! /api/admin/...                     - See [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod chatbot;
pub mod corporate;
pub mod exchange;
pub mod gullak;
pub mod orders;
pub mod rates;
pub mod tutorials;
pub mod validation;
pub mod wholesaler;
pub mod wishlist;

use axum::Router;

use crate::middleware::{auth_rate_limiter, chatbot_rate_limiter};
use crate::state::AppState;

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth::router().layer(auth_rate_limiter()))
        .merge(catalog::router())
        .merge(rates::router())
        .nest("/care-tutorials", tutorials::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .merge(orders::router())
        .nest("/exchange", exchange::router())
        .nest("/gullak", gullak::router())
        .nest("/corporate", corporate::router())
        .nest("/wholesaler", wholesaler::router())
        .nest("/chatbot", chatbot::router().layer(chatbot_rate_limiter()))
        .nest("/admin", admin::router());

    Router::new().nest("/api", api)
}

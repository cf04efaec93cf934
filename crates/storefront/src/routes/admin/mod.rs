//! Back-office JSON API. Every handler requires an admin session.

pub mod accounts;
pub mod catalog;
pub mod content;
pub mod daybook;
pub mod exchange;
pub mod orders;
pub mod partners;
pub mod rates;
pub mod stock;

use axum::Router;

use crate::state::AppState;

/// All admin routes, mounted under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .merge(orders::router())
        .merge(rates::router())
        .merge(exchange::router())
        .merge(stock::router())
        .merge(daybook::router())
        .merge(partners::router())
        .merge(content::router())
        .merge(accounts::router())
}

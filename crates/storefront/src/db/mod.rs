//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `store`
//!
//! - `users` - Customers, wholesalers and admins
//! - `categories`, `products`, `care_tutorials` - Catalog
//! - `market_rates` - Daily metal rates per purity
//! - `cart_items`, `wishlist_items`, `orders`, `order_items` - Shopping
//! - `exchange_requests` - Old-jewelry exchange workflow
//! - `stock_movements`, `offline_sales` - Back office ledger
//! - `corporate_registrations`, `wholesaler_designs` - Partner workflows
//! - `gullak_accounts`, `gullak_payments` - Recurring savings plans
//!
//! Session rows live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p kanak-cli -- migrate
//! ```

pub mod cart;
pub mod catalog;
pub mod corporate;
pub mod daybook;
pub mod designs;
pub mod exchange;
pub mod gullak;
pub mod market_rates;
pub mod offline_sales;
pub mod orders;
pub mod stock;
pub mod tutorials;
pub mod users;
pub mod wishlist;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use corporate::CorporateRepository;
pub use daybook::DayBookRepository;
pub use designs::DesignRepository;
pub use exchange::ExchangeRepository;
pub use gullak::GullakRepository;
pub use market_rates::MarketRateRepository;
pub use offline_sales::OfflineSaleRepository;
pub use orders::OrderRepository;
pub use stock::StockRepository;
pub use tutorials::TutorialRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, already reviewed).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The operation breaks a business rule (e.g., not enough stock).
    #[error("{0}")]
    Rejected(String),

    /// A failure shared by every caller of a coalesced cache load.
    #[error("{0}")]
    Shared(Arc<RepositoryError>),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to domain errors.
    pub(crate) fn from_constraint(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound;
            }
        }
        Self::Database(err)
    }

    /// Conflict for a second review of a record that already left `pending`.
    pub(crate) fn already_reviewed(
        current: kanak_core::ReviewStatus,
        wanted: kanak_core::ReviewStatus,
    ) -> Self {
        match current.transition(wanted) {
            Err(e) => Self::Conflict(format!("already {current}: {e}")),
            Ok(_) => Self::Conflict("review raced with another update".to_string()),
        }
    }
}

/// Page bounds for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub const MAX_PER_PAGE: i64 = 60;
    pub const DEFAULT_PER_PAGE: i64 = 24;

    /// Clamp client-supplied paging to sane bounds.
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

//! Ledger queries feeding the day book.
//!
//! Online entries come from orders that weren't cancelled; offline entries
//! from counter sales. Rows are fetched by UTC instant and bucketed into
//! store-local days by the caller-supplied converter.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use kanak_core::PaymentMethod;
use kanak_core::daybook::{LedgerEntry, SalesChannel};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct LedgerRow {
    at: DateTime<Utc>,
    payment_method: PaymentMethod,
    amount: Decimal,
    items: i64,
}

impl LedgerRow {
    fn into_entry(
        self,
        channel: SalesChannel,
        local_date: &impl Fn(DateTime<Utc>) -> NaiveDate,
    ) -> LedgerEntry {
        LedgerEntry {
            date: local_date(self.at),
            channel,
            payment_method: self.payment_method,
            amount: self.amount,
            items: i32::try_from(self.items).unwrap_or(i32::MAX),
        }
    }
}

/// Repository for day-book ledger queries.
pub struct DayBookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DayBookRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All sales in `[from, to)`, dated with `local_date`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn entries(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        local_date: impl Fn(DateTime<Utc>) -> NaiveDate,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let online = sqlx::query_as::<_, LedgerRow>(
            r"
            SELECT o.created_at AS at, o.payment_method, o.total AS amount,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS items
            FROM store.orders o
            LEFT JOIN store.order_items oi ON oi.order_id = o.id
            WHERE o.created_at >= $1 AND o.created_at < $2 AND o.status <> 'cancelled'
            GROUP BY o.id
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        let offline = sqlx::query_as::<_, LedgerRow>(
            r"
            SELECT sold_at AS at, payment_method, total AS amount, quantity::BIGINT AS items
            FROM store.offline_sales
            WHERE sold_at >= $1 AND sold_at < $2
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        let entries = online
            .into_iter()
            .map(|row| row.into_entry(SalesChannel::Online, &local_date))
            .chain(
                offline
                    .into_iter()
                    .map(|row| row.into_entry(SalesChannel::Offline, &local_date)),
            )
            .collect();

        Ok(entries)
    }
}

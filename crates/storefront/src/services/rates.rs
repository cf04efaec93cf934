//! Cached market-rate board.
//!
//! The board changes at most a few times a day but is read by the rate
//! endpoint, exchange estimates, Gullak payments and every chatbot turn.
//! It is cached per store-local date for 5 minutes; the admin rate update
//! invalidates it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use kanak_core::Purity;

use crate::db::{MarketRateRepository, RepositoryError};
use crate::models::catalog::MarketRate;

const RATE_TTL: Duration = Duration::from_secs(300);

type Board = Arc<Vec<MarketRate>>;

/// The current rate per `(metal, purity)`, cached.
///
/// Entries are keyed by date and invalidation generation. A load that began
/// before [`RateBoard::invalidate`] lands under the old generation and is
/// never read again.
#[derive(Clone)]
pub struct RateBoard {
    cache: Cache<(NaiveDate, u64), Board>,
    generation: Arc<AtomicU64>,
}

impl Default for RateBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RateBoard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(8)
                .time_to_live(RATE_TTL)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Rates effective on `today`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the board isn't cached and the query
    /// fails.
    #[instrument(skip(self, pool))]
    pub async fn current(&self, pool: &PgPool, today: NaiveDate) -> Result<Board, RepositoryError> {
        self.load(today, async move {
            debug!("Rate board cache miss");
            MarketRateRepository::new(pool).current(today).await
        })
        .await
    }

    /// Cached board for `today`, running `loader` at most once per
    /// generation however many callers miss at the same time.
    async fn load<F>(&self, today: NaiveDate, loader: F) -> Result<Board, RepositoryError>
    where
        F: Future<Output = Result<Vec<MarketRate>, RepositoryError>>,
    {
        let key = (today, self.generation.load(Ordering::Acquire));
        self.cache
            .try_get_with(key, async move { loader.await.map(Arc::new) })
            .await
            .map_err(RepositoryError::Shared)
    }

    /// Rate per gram for one purity grade, if one has been published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the board can't be loaded.
    pub async fn rate_for(
        &self,
        pool: &PgPool,
        purity: Purity,
        today: NaiveDate,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let rates = self.current(pool, today).await?;
        Ok(rate_in(&rates, purity))
    }

    /// Drop every cached board, including any still loading.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

fn rate_in(rates: &[MarketRate], purity: Purity) -> Option<Decimal> {
    rates
        .iter()
        .find(|r| r.purity == purity)
        .map(|r| r.rate_per_gram)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tokio::sync::oneshot;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).expect("valid date")
    }

    fn rate(purity: Purity, rate_per_gram: Decimal) -> MarketRate {
        MarketRate {
            id: 3.into(),
            metal: purity.metal(),
            purity,
            rate_per_gram,
            effective_date: day(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rate_in_board() {
        let rates = vec![rate(Purity::Silver925, Decimal::new(9_850, 2))];

        assert_eq!(rate_in(&rates, Purity::Silver925), Some(Decimal::new(9_850, 2)));
        assert_eq!(rate_in(&rates, Purity::K22), None);
    }

    #[tokio::test]
    async fn test_board_is_cached_until_invalidated() {
        let board = RateBoard::new();
        let first = board
            .load(day(), async { Ok(vec![rate(Purity::K22, Decimal::new(6000, 0))]) })
            .await
            .expect("load");
        let cached = board
            .load(day(), async { Ok(vec![rate(Purity::K22, Decimal::new(7000, 0))]) })
            .await
            .expect("load");
        assert_eq!(rate_in(&first, Purity::K22), rate_in(&cached, Purity::K22));

        board.invalidate().await;
        let fresh = board
            .load(day(), async { Ok(vec![rate(Purity::K22, Decimal::new(7000, 0))]) })
            .await
            .expect("load");
        assert_eq!(rate_in(&fresh, Purity::K22), Some(Decimal::new(7000, 0)));
    }

    #[tokio::test]
    async fn test_load_racing_invalidate_is_not_served() {
        let board = RateBoard::new();
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let slow = board.clone();
        let stale = tokio::spawn(async move {
            slow.load(day(), async move {
                let _ = started_tx.send(());
                let _ = release_rx.await;
                Ok(vec![rate(Purity::K22, Decimal::new(6000, 0))])
            })
            .await
        });

        started_rx.await.expect("loader started");
        board.invalidate().await;
        release_tx.send(()).expect("loader waiting");
        stale.await.expect("task").expect("load");

        let fresh = board
            .load(day(), async { Ok(vec![rate(Purity::K22, Decimal::new(6500, 0))]) })
            .await
            .expect("load");
        assert_eq!(rate_in(&fresh, Purity::K22), Some(Decimal::new(6500, 0)));
    }

    #[tokio::test]
    async fn test_load_error_is_shared_not_cached() {
        let board = RateBoard::new();
        let err = board
            .load(day(), async { Err(RepositoryError::NotFound) })
            .await
            .expect_err("load fails");
        assert!(matches!(
            err,
            RepositoryError::Shared(ref inner) if matches!(**inner, RepositoryError::NotFound)
        ));

        let rates = board
            .load(day(), async { Ok(vec![rate(Purity::K24, Decimal::new(7200, 0))]) })
            .await
            .expect("retry loads");
        assert_eq!(rates.len(), 1);
    }
}

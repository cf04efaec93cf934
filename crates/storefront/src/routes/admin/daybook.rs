//! Day-book: online and counter sales reconciled per store-local day.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;

use kanak_core::daybook::DayBook;

use crate::db::DayBookRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Longest range report, in days.
pub const MAX_RANGE_DAYS: i64 = 92;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/daybook", get(day))
        .route("/daybook/range", get(range))
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Books for `from..=to`, oldest first.
async fn books(state: &AppState, from: NaiveDate, to: NaiveDate) -> Result<Vec<DayBook>> {
    let rules = state.rules();
    let (start, end) = rules
        .day_span(from, to)
        .ok_or_else(|| AppError::BadRequest("date out of range".to_string()))?;
    let entries = DayBookRepository::new(state.pool())
        .entries(start, end, |at| rules.local_date(at))
        .await?;
    Ok(DayBook::series(from, to, &entries))
}

fn check_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if to < from {
        return Err(AppError::BadRequest("to must not be before from".to_string()));
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(AppError::BadRequest(format!(
            "range must be at most {MAX_RANGE_DAYS} days"
        )));
    }
    Ok(())
}

/// GET /api/admin/daybook?date=YYYY-MM-DD
async fn day(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayBook>> {
    let date = query.date.unwrap_or_else(|| state.rules().today());
    books(&state, date, date)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::Internal("empty day-book series".to_string()))
}

/// GET /api/admin/daybook/range?from=&to=
async fn range(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DayBook>>> {
    check_range(query.from, query.to)?;
    Ok(Json(books(&state, query.from, query.to).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: &str) -> NaiveDate {
        d.parse().expect("valid date")
    }

    #[test]
    fn test_range_limits() {
        assert!(check_range(date("2026-01-01"), date("2026-01-01")).is_ok());
        // 92 days inclusive
        assert!(check_range(date("2026-01-01"), date("2026-04-02")).is_ok());
        assert!(check_range(date("2026-01-01"), date("2026-04-03")).is_err());
        assert!(check_range(date("2026-02-01"), date("2026-01-31")).is_err());
    }
}

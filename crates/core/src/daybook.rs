//! Daily sales ledger.
//!
//! Folds online orders and counter sales into a single summary per day,
//! broken down by channel and by payment method.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::PaymentMethod;

/// Where a sale happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    Online,
    Offline,
}

/// One sale as it enters the day book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Store-local calendar day of the sale.
    pub date: NaiveDate,
    pub channel: SalesChannel,
    pub payment_method: PaymentMethod,
    pub amount: Decimal,
    /// Pieces sold.
    pub items: i32,
}

/// Count and value of sales in one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub transactions: i64,
    pub items: i64,
    pub amount: Decimal,
}

impl Tally {
    fn add(&mut self, entry: &LedgerEntry) {
        self.transactions += 1;
        self.items += i64::from(entry.items);
        self.amount += entry.amount;
    }
}

/// Totals for a single method within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTally {
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub tally: Tally,
}

/// Summary of one day's sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBook {
    pub date: NaiveDate,
    pub online: Tally,
    pub offline: Tally,
    pub total: Tally,
    /// Sorted by payment method.
    pub by_payment_method: Vec<MethodTally>,
}

impl DayBook {
    /// Summarize the entries dated `date`. Entries for other days are ignored.
    #[must_use]
    pub fn from_entries(date: NaiveDate, entries: &[LedgerEntry]) -> Self {
        let mut online = Tally::default();
        let mut offline = Tally::default();
        let mut total = Tally::default();
        let mut methods: BTreeMap<PaymentMethod, Tally> = BTreeMap::new();

        for entry in entries.iter().filter(|e| e.date == date) {
            match entry.channel {
                SalesChannel::Online => online.add(entry),
                SalesChannel::Offline => offline.add(entry),
            }
            total.add(entry);
            methods.entry(entry.payment_method).or_default().add(entry);
        }

        Self {
            date,
            online,
            offline,
            total,
            by_payment_method: methods
                .into_iter()
                .map(|(payment_method, tally)| MethodTally {
                    payment_method,
                    tally,
                })
                .collect(),
        }
    }

    /// One summary per day from `from` to `to` inclusive, oldest first.
    /// Days with no sales appear with zero totals.
    #[must_use]
    pub fn series(from: NaiveDate, to: NaiveDate, entries: &[LedgerEntry]) -> Vec<Self> {
        let mut days = Vec::new();
        let mut current = from;
        while current <= to {
            days.push(Self::from_entries(current, entries));
            match current.checked_add_days(Days::new(1)) {
                Some(next) => current = next,
                None => break,
            }
        }
        days
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn entry(d: u32, channel: SalesChannel, method: PaymentMethod, amount: i64) -> LedgerEntry {
        LedgerEntry {
            date: date(d),
            channel,
            payment_method: method,
            amount: Decimal::new(amount, 0),
            items: 1,
        }
    }

    #[test]
    fn test_day_totals_by_channel_and_method() {
        let entries = [
            entry(5, SalesChannel::Online, PaymentMethod::Online, 12_000),
            entry(5, SalesChannel::Offline, PaymentMethod::Cash, 4_500),
            entry(5, SalesChannel::Offline, PaymentMethod::Upi, 8_000),
            entry(5, SalesChannel::Offline, PaymentMethod::Cash, 1_500),
            entry(6, SalesChannel::Offline, PaymentMethod::Card, 99_000),
        ];

        let book = DayBook::from_entries(date(5), &entries);
        assert_eq!(book.online.amount, Decimal::new(12_000, 0));
        assert_eq!(book.offline.amount, Decimal::new(14_000, 0));
        assert_eq!(book.offline.transactions, 3);
        assert_eq!(book.total.amount, Decimal::new(26_000, 0));
        assert_eq!(book.total.items, 4);

        let methods: Vec<_> = book
            .by_payment_method
            .iter()
            .map(|m| (m.payment_method, m.tally.amount))
            .collect();
        assert_eq!(
            methods,
            vec![
                (PaymentMethod::Cash, Decimal::new(6_000, 0)),
                (PaymentMethod::Upi, Decimal::new(8_000, 0)),
                (PaymentMethod::Online, Decimal::new(12_000, 0)),
            ]
        );
    }

    #[test]
    fn test_channel_totals_add_up() {
        let entries = [
            entry(5, SalesChannel::Online, PaymentMethod::Online, 700),
            entry(5, SalesChannel::Offline, PaymentMethod::Card, 300),
        ];
        let book = DayBook::from_entries(date(5), &entries);
        assert_eq!(book.online.amount + book.offline.amount, book.total.amount);
        let by_method: Decimal = book.by_payment_method.iter().map(|m| m.tally.amount).sum();
        assert_eq!(by_method, book.total.amount);
    }

    #[test]
    fn test_empty_day() {
        let book = DayBook::from_entries(date(1), &[]);
        assert_eq!(book.total, Tally::default());
        assert!(book.by_payment_method.is_empty());
    }

    #[test]
    fn test_series_fills_gaps() {
        let entries = [
            entry(2, SalesChannel::Offline, PaymentMethod::Cash, 100),
            entry(4, SalesChannel::Online, PaymentMethod::Online, 200),
        ];
        let series = DayBook::series(date(1), date(4), &entries);
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].total.transactions, 0);
        assert_eq!(series[1].total.amount, Decimal::new(100, 0));
        assert_eq!(series[2].total.transactions, 0);
        assert_eq!(series[3].online.amount, Decimal::new(200, 0));
    }

    #[test]
    fn test_series_empty_when_reversed() {
        assert!(DayBook::series(date(4), date(1), &[]).is_empty());
    }
}

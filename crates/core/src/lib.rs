//! Kanak Jewels Core - Shared domain types and business rules.
//!
//! This crate provides the pieces shared by every Kanak component:
//! - `storefront` - JSON API for customers, wholesalers, and the back office
//! - `cli` - Command-line tools for migrations, seeding, and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Anything that can be decided without touching the
//! database (checkout totals, Gullak schedules, day-book aggregation, status
//! transitions) lives here so it can be unit tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, emails, metals, and status enums
//! - [`checkout`] - Cart quantity rules and checkout totals
//! - [`pricing`] - Metal valuation and exchange estimates
//! - [`gullak`] - Recurring savings plan schedule and progress
//! - [`daybook`] - Daily sales reconciliation across channels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod daybook;
pub mod gullak;
pub mod pricing;
pub mod types;

pub use types::*;

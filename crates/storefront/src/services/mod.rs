//! Business services layered over the repositories.
//!
//! - [`auth`] - Registration, login and password hashing
//! - [`rates`] - The cached market-rate board

pub mod auth;
pub mod rates;

pub use rates::RateBoard;

//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and serialize straight into the JSON API.

pub mod catalog;
pub mod commerce;
pub mod gullak;
pub mod ledger;
pub mod session;
pub mod user;
pub mod workflows;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;

//! User account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kanak_core::{Email, UserId, UserRole};

/// A store account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

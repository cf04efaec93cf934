//! Status and classification enums for various entities.
//!
//! Every enum here is stored as a `PostgreSQL` enum in the `store` schema and
//! serialized as `snake_case` in the JSON API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Implements `Display` and `FromStr` from a single list of variant labels.
macro_rules! impl_labels {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            /// Database/JSON label for this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $kind, ": {}"), s)),
                }
            }
        }
    };
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move from {from} to {to}")]
pub struct TransitionError {
    /// Current status label.
    pub from: &'static str,
    /// Requested status label.
    pub to: &'static str,
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Retail shopper.
    #[default]
    Customer,
    /// Trade partner who submits designs for the catalog.
    Wholesaler,
    /// Back-office staff.
    Admin,
}

impl_labels!(UserRole, "role", {
    Customer => "customer",
    Wholesaler => "wholesaler",
    Admin => "admin",
});

/// Online order lifecycle.
///
/// ```text
/// pending ──► confirmed ──► shipped ──► delivered
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl_labels!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if `next` is not reachable from `self`.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Admin review outcome for exchange requests, corporate registrations,
/// and wholesaler designs.
///
/// A record leaves `Pending` exactly once, to `Approved` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.review_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl_labels!(ReviewStatus, "review status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl ReviewStatus {
    /// Validate a review decision.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` unless moving from `Pending` to a decision.
    pub const fn transition(self, decision: Self) -> Result<Self, TransitionError> {
        match (self, decision) {
            (Self::Pending, Self::Approved | Self::Rejected) => Ok(decision),
            _ => Err(TransitionError {
                from: self.as_str(),
                to: decision.as_str(),
            }),
        }
    }
}

/// How a sale was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    Online,
}

impl_labels!(PaymentMethod, "payment method", {
    Cash => "cash",
    Card => "card",
    Upi => "upi",
    BankTransfer => "bank_transfer",
    Online => "online",
});

/// Reason for a change in a product's stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.stock_movement_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StockMovementKind {
    /// New pieces received.
    Inward,
    /// Stock count correction, either direction.
    Adjustment,
    /// Sold through the website.
    OnlineSale,
    /// Sold at the counter.
    OfflineSale,
    /// Returned to stock (cancelled order or customer return).
    Return,
}

impl_labels!(StockMovementKind, "stock movement kind", {
    Inward => "inward",
    Adjustment => "adjustment",
    OnlineSale => "online_sale",
    OfflineSale => "offline_sale",
    Return => "return",
});

impl StockMovementKind {
    /// Whether a delta with this sign is allowed for this kind.
    #[must_use]
    pub const fn accepts_delta(self, delta: i32) -> bool {
        match self {
            Self::Inward | Self::Return => delta > 0,
            Self::OnlineSale | Self::OfflineSale => delta < 0,
            Self::Adjustment => delta != 0,
        }
    }

    /// Kinds an admin may record by hand. Sales are written by checkout and
    /// the offline-sale ledger.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Inward | Self::Adjustment | Self::Return)
    }
}

/// Gullak plan lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.gullak_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum GullakStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl_labels!(GullakStatus, "gullak status", {
    Active => "active",
    Paused => "paused",
    Completed => "completed",
});

/// How often a Gullak installment falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "store.payment_frequency", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl_labels!(PaymentFrequency, "payment frequency", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

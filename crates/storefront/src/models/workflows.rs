//! Records that wait for an admin decision: exchange requests, corporate
//! registrations and wholesaler designs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kanak_core::{
    CorporateRegistrationId, DesignId, ExchangeRequestId, MetalType, OrderId, Purity,
    ReviewStatus, UserId,
};

/// Old jewelry offered in exchange for store credit.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExchangeRequest {
    pub id: ExchangeRequestId,
    pub user_id: UserId,
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    pub description: String,
    pub image_url: Option<String>,
    pub estimated_value: Decimal,
    /// Credit granted on approval.
    pub appraised_value: Option<Decimal>,
    pub status: ReviewStatus,
    pub admin_note: Option<String>,
    /// Order the credit was spent on, if any.
    pub redeemed_order_id: Option<OrderId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ExchangeRequest {
    /// Credit still available to spend at checkout.
    #[must_use]
    pub fn available_credit(&self) -> Option<Decimal> {
        match (self.status, self.redeemed_order_id) {
            (ReviewStatus::Approved, None) => self.appraised_value,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CorporateRegistration {
    pub id: CorporateRegistrationId,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub employee_count: Option<i32>,
    pub gst_number: Option<String>,
    pub message: Option<String>,
    pub status: ReviewStatus,
    /// Negotiated discount, set on approval.
    pub discount_percent: Option<Decimal>,
    pub admin_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A design a wholesaler proposes for the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WholesalerDesign {
    pub id: DesignId,
    pub wholesaler_id: UserId,
    pub title: String,
    pub description: String,
    pub metal: MetalType,
    pub purity: Purity,
    pub weight_grams: Decimal,
    pub wholesale_price: Decimal,
    pub image_url: Option<String>,
    pub status: ReviewStatus,
    pub admin_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

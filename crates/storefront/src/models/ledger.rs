//! Back-office ledger types: stock levels, movements and counter sales.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kanak_core::{
    MetalType, OfflineSaleId, PaymentMethod, ProductId, Purity, StockMovementId,
    StockMovementKind, UserId,
};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub metal: MetalType,
    pub purity: Purity,
    pub stock_quantity: i32,
    pub is_active: bool,
    /// At or below the configured threshold.
    pub low_stock: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockMovement {
    pub id: StockMovementId,
    pub product_id: ProductId,
    pub kind: StockMovementKind,
    pub quantity_delta: i32,
    pub note: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OfflineSale {
    pub id: OfflineSaleId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub recorded_by: Option<UserId>,
    pub sold_at: DateTime<Utc>,
}

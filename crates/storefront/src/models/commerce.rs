//! Cart, wishlist and order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kanak_core::checkout::{CartQuantity, CheckoutTotals, PricedLine};
use kanak_core::{
    CartItemId, ExchangeRequestId, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId,
    UserId, WishlistItemId,
};

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub stock_quantity: i32,
    pub is_active: bool,
}

impl CartLine {
    #[must_use]
    pub const fn priced(&self) -> PricedLine {
        PricedLine {
            unit_price: self.unit_price,
            quantity: CartQuantity::clamped(self.quantity),
        }
    }
}

/// The cart plus its current quote.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub totals: CheckoutTotals,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub exchange_discount: Decimal,
    pub total: Decimal,
    pub exchange_request_id: Option<ExchangeRequestId>,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line on an order. Name and price are snapshots taken at checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

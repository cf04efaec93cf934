//! Order repository.
//!
//! Placing an order is one transaction: lock the cart and its products,
//! check stock, price the cart, write the order and its items, take the
//! stock out, spend the exchange credit, and empty the cart.

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use kanak_core::checkout::{CheckoutTotals, ShippingPolicy};
use kanak_core::{
    ExchangeRequestId, OrderId, OrderStatus, PaymentMethod, StockMovementKind, UserId,
};

use super::RepositoryError;
use super::exchange::EXCHANGE_COLUMNS;
use super::stock::move_stock;
use crate::models::commerce::{CartLine, Order, OrderDetail, OrderItem};
use crate::models::workflows::ExchangeRequest;

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, status, subtotal, shipping, exchange_discount, total,
    exchange_request_id, payment_method, shipping_address, phone, created_at, updated_at
";

const ORDER_NUMBER_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Checkout details supplied by the customer.
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub shipping_address: &'a str,
    pub phone: &'a str,
    pub payment_method: PaymentMethod,
    pub exchange_request_id: Option<ExchangeRequestId>,
}

/// `KJ-YYYYMMDD-XXXXXX`.
#[must_use]
pub fn generate_order_number(date: NaiveDate) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_CHARSET.len());
            char::from(ORDER_NUMBER_CHARSET.get(idx).copied().unwrap_or(b'X'))
        })
        .collect();
    format!("KJ-{}-{suffix}", date.format("%Y%m%d"))
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Price the user's cart without placing anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exchange request isn't the user's.
    /// Returns `RepositoryError::Rejected` if its credit can't be spent.
    pub async fn quote(
        &self,
        user_id: UserId,
        exchange_request_id: Option<ExchangeRequestId>,
        shipping: &ShippingPolicy,
    ) -> Result<(Vec<CartLine>, CheckoutTotals), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let lines = cart_lines(&mut tx, user_id, false).await?;
        let credit = match exchange_request_id {
            Some(id) => exchange_credit(&mut tx, id, user_id, false).await?,
            None => Decimal::ZERO,
        };
        tx.commit().await?;

        let totals = price(&lines, shipping, credit)?;
        Ok((lines, totals))
    }

    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` for an empty cart, an unavailable
    /// product, insufficient stock, or unusable exchange credit.
    /// Returns `RepositoryError::NotFound` if the exchange request isn't the user's.
    pub async fn place(
        &self,
        new: &NewOrder<'_>,
        shipping: &ShippingPolicy,
        today: NaiveDate,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = cart_lines(&mut tx, new.user_id, true).await?;
        if lines.is_empty() {
            return Err(RepositoryError::Rejected("cart is empty".to_string()));
        }
        for line in &lines {
            if !line.is_active {
                return Err(RepositoryError::Rejected(format!(
                    "{} is no longer available",
                    line.name
                )));
            }
            if line.quantity > line.stock_quantity {
                return Err(RepositoryError::Rejected(format!(
                    "only {} of {} in stock",
                    line.stock_quantity, line.name
                )));
            }
        }

        let credit = match new.exchange_request_id {
            Some(id) => exchange_credit(&mut tx, id, new.user_id, true).await?,
            None => Decimal::ZERO,
        };
        let totals = price(&lines, shipping, credit)?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO store.orders (
                order_number, user_id, subtotal, shipping, exchange_discount, total,
                exchange_request_id, payment_method, shipping_address, phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(generate_order_number(today))
        .bind(new.user_id)
        .bind(totals.subtotal)
        .bind(totals.shipping)
        .bind(totals.exchange_discount)
        .bind(totals.total)
        .bind(new.exchange_request_id)
        .bind(new.payment_method)
        .bind(new.shipping_address)
        .bind(new.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "order number collision, try again"))?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let priced = line.priced();
            let item = sqlx::query_as::<_, OrderItem>(
                r"
                INSERT INTO store.order_items
                    (order_id, product_id, product_name, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, product_id, product_name, unit_price, quantity, line_total
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.unit_price)
            .bind(priced.quantity.get())
            .bind(priced.line_total())
            .fetch_one(&mut *tx)
            .await?;

            move_stock(
                &mut tx,
                line.product_id,
                StockMovementKind::OnlineSale,
                -priced.quantity.get(),
                Some(order.order_number.as_str()),
                None,
            )
            .await?;
            items.push(item);
        }

        if let Some(exchange_id) = new.exchange_request_id {
            sqlx::query("UPDATE store.exchange_requests SET redeemed_order_id = $2 WHERE id = $1")
                .bind(exchange_id)
                .bind(order.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM store.cart_items WHERE user_id = $1")
            .bind(new.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );

        Ok(OrderDetail { order, items })
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM store.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// All orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM store.orders
            WHERE ($1::store.order_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// An order with its items. `owner` restricts the lookup to one user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such order for the owner.
    pub async fn get_detail(
        &self,
        id: OrderId,
        owner: Option<UserId>,
    ) -> Result<OrderDetail, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM store.orders
            WHERE id = $1 AND ($2::INTEGER IS NULL OR user_id = $2)
            "
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = order_items(self.pool, id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Move an order along the status table. `owner` restricts the change to
    /// one user's orders; customers may only cancel while pending.
    ///
    /// Cancelling puts the items back in stock and frees the exchange credit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such order for the owner.
    /// Returns `RepositoryError::Conflict` if the transition isn't allowed.
    pub async fn change_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        owner: Option<UserId>,
        changed_by: UserId,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderStatus, String)> = sqlx::query_as(
            r"
            SELECT status, order_number FROM store.orders
            WHERE id = $1 AND ($2::INTEGER IS NULL OR user_id = $2)
            FOR UPDATE
            ",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;
        let (current, order_number) = current.ok_or(RepositoryError::NotFound)?;

        if owner.is_some() && (next != OrderStatus::Cancelled || current != OrderStatus::Pending) {
            return Err(RepositoryError::Conflict(format!(
                "a {current} order cannot be changed by the customer"
            )));
        }
        current
            .transition(next)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE store.orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        let items = order_items(&mut *tx, id).await?;

        if next == OrderStatus::Cancelled {
            let note = format!("{order_number} cancelled");
            for item in &items {
                move_stock(
                    &mut tx,
                    item.product_id,
                    StockMovementKind::Return,
                    item.quantity,
                    Some(note.as_str()),
                    Some(changed_by),
                )
                .await?;
            }

            sqlx::query(
                "UPDATE store.exchange_requests SET redeemed_order_id = NULL WHERE redeemed_order_id = $1",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %id, from = %current, to = %next, "Order status changed");

        Ok(OrderDetail { order, items })
    }
}

async fn cart_lines(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    lock: bool,
) -> Result<Vec<CartLine>, RepositoryError> {
    // Lock in product order so concurrent checkouts can't deadlock
    let lock_clause = if lock { "FOR UPDATE OF ci, p" } else { "" };
    let lines = sqlx::query_as::<_, CartLine>(&format!(
        r"
        SELECT ci.id, ci.product_id, p.name, p.slug, p.image_url, p.price AS unit_price,
               ci.quantity, p.stock_quantity, p.is_active
        FROM store.cart_items ci
        JOIN store.products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY p.id
        {lock_clause}
        "
    ))
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(lines)
}

async fn exchange_credit(
    tx: &mut Transaction<'_, Postgres>,
    id: ExchangeRequestId,
    user_id: UserId,
    lock: bool,
) -> Result<Decimal, RepositoryError> {
    let lock_clause = if lock { "FOR UPDATE" } else { "" };
    let request = sqlx::query_as::<_, ExchangeRequest>(&format!(
        r"
        SELECT {EXCHANGE_COLUMNS} FROM store.exchange_requests
        WHERE id = $1 AND user_id = $2
        {lock_clause}
        "
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    request.available_credit().ok_or_else(|| {
        RepositoryError::Rejected(format!(
            "exchange request {id} has no credit available ({})",
            if request.redeemed_order_id.is_some() {
                "already redeemed".to_string()
            } else {
                request.status.to_string()
            }
        ))
    })
}

fn price(
    lines: &[CartLine],
    shipping: &ShippingPolicy,
    credit: Decimal,
) -> Result<CheckoutTotals, RepositoryError> {
    let priced: Vec<_> = lines.iter().map(CartLine::priced).collect();
    CheckoutTotals::compute(&priced, shipping, credit)
        .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
}

async fn order_items<'e, E>(executor: E, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    let items = sqlx::query_as::<_, OrderItem>(
        r"
        SELECT id, product_id, product_name, unit_price, quantity, line_total
        FROM store.order_items
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap_or_default();
        let number = generate_order_number(date);
        assert!(number.starts_with("KJ-20260309-"));
        assert_eq!(number.len(), "KJ-20260309-".len() + 6);
        assert!(
            number
                .trim_start_matches("KJ-20260309-")
                .bytes()
                .all(|b| ORDER_NUMBER_CHARSET.contains(&b))
        );
    }
}

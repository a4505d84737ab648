//! # Order Repository
//!
//! Orders and their lines.
//!
//! Lines are written once with the order and never updated. Order updates
//! are version-checked:
//!
//! ```text
//! UPDATE orders SET ..., version = version + 1
//!  WHERE id = ?id AND version = ?expected
//!
//! 0 rows + row exists  → UpdateOutcome::Stale
//! 0 rows + no row      → NotFound
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use vantage_core::{DiscountKind, Order, OrderLine, OrderStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: String,
    pub customer_id: String,
    pub cashier_id: Option<String>,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: i64,
    pub discount_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub is_online: bool,
    pub shipping_address: Option<String>,
    pub loyalty_points_earned: i64,
    pub loyalty_points_redeemed: i64,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            cashier_id: self.cashier_id,
            status: self.status,
            lines,
            subtotal_cents: self.subtotal_cents,
            discount_kind: self.discount_kind,
            discount_value: self.discount_value,
            discount_cents: self.discount_cents,
            tax_rate_bps: self.tax_rate_bps,
            tax_cents: self.tax_cents,
            shipping_cents: self.shipping_cents,
            total_cents: self.total_cents,
            is_online: self.is_online,
            shipping_address: self.shipping_address,
            loyalty_points_earned: self.loyalty_points_earned,
            loyalty_points_redeemed: self.loyalty_points_redeemed,
            notes: self.notes,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLineRecord {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub discount_cents: i64,
    pub subtotal_cents: i64,
    pub position: i64,
}

impl From<OrderLineRecord> for OrderLine {
    fn from(r: OrderLineRecord) -> Self {
        OrderLine {
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            name_snapshot: r.name_snapshot,
            unit_price_cents: r.unit_price_cents,
            quantity: r.quantity,
            discount_cents: r.discount_cents,
            subtotal_cents: r.subtotal_cents,
            position: r.position,
        }
    }
}

/// Result of a version-checked update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// Someone else updated the row since it was read.
    Stale,
}

/// Gets an order with its lines in receipt order.
pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let record = sqlx::query_as::<_, OrderRecord>(
        r#"
        SELECT
            id, customer_id, cashier_id, status,
            subtotal_cents, discount_kind, discount_value, discount_cents,
            tax_rate_bps, tax_cents, shipping_cents, total_cents,
            is_online, shipping_address,
            loyalty_points_earned, loyalty_points_redeemed, notes,
            version, created_at, updated_at, completed_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    let lines = sqlx::query_as::<_, OrderLineRecord>(
        r#"
        SELECT
            id, order_id, product_id, name_snapshot,
            unit_price_cents, quantity, discount_cents, subtotal_cents, position
        FROM order_lines
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(
        record.into_order(lines.into_iter().map(OrderLine::from).collect()),
    ))
}

/// Inserts an order and all of its lines.
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, customer_id, cashier_id, status,
            subtotal_cents, discount_kind, discount_value, discount_cents,
            tax_rate_bps, tax_cents, shipping_cents, total_cents,
            is_online, shipping_address,
            loyalty_points_earned, loyalty_points_redeemed, notes,
            version, created_at, updated_at, completed_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(&order.cashier_id)
    .bind(order.status)
    .bind(order.subtotal_cents)
    .bind(order.discount_kind)
    .bind(order.discount_value)
    .bind(order.discount_cents)
    .bind(order.tax_rate_bps)
    .bind(order.tax_cents)
    .bind(order.shipping_cents)
    .bind(order.total_cents)
    .bind(order.is_online)
    .bind(&order.shipping_address)
    .bind(order.loyalty_points_earned)
    .bind(order.loyalty_points_redeemed)
    .bind(&order.notes)
    .bind(order.version)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    for line in &order.lines {
        sqlx::query(
            r#"
            INSERT INTO order_lines (
                id, order_id, product_id, name_snapshot,
                unit_price_cents, quantity, discount_cents, subtotal_cents, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&line.id)
        .bind(&order.id)
        .bind(&line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.unit_price_cents)
        .bind(line.quantity)
        .bind(line.discount_cents)
        .bind(line.subtotal_cents)
        .bind(line.position)
        .execute(&mut *conn)
        .await?;
    }

    debug!(order_id = %order.id, lines = order.lines.len(), "Order inserted");
    Ok(())
}

/// Writes the mutable order columns if `order.version` is still current.
pub async fn update_versioned(conn: &mut SqliteConnection, order: &Order) -> DbResult<UpdateOutcome> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = ?3,
            loyalty_points_earned = ?4,
            loyalty_points_redeemed = ?5,
            notes = ?6,
            updated_at = ?7,
            completed_at = ?8,
            version = version + 1
        WHERE id = ?1 AND version = ?2
        "#,
    )
    .bind(&order.id)
    .bind(order.version)
    .bind(order.status)
    .bind(order.loyalty_points_earned)
    .bind(order.loyalty_points_redeemed)
    .bind(&order.notes)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(UpdateOutcome::Updated);
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = ?1")
        .bind(&order.id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => Ok(UpdateOutcome::Stale),
        None => Err(DbError::not_found("Order", &order.id)),
    }
}

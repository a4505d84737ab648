//! # Payment Repository
//!
//! Payment and refund records. Refund details are flattened into nullable
//! columns on the same row.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};
use vantage_core::{Payment, PaymentMethod, PaymentStatus, RefundDetail};

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, amount_cents, method, status, reference,
    card_last4, card_brand, tendered_cents, change_cents,
    refund_id, source_payment_id, refunded_cents, refund_reason, refunded_at,
    recorded_by, created_at, updated_at
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    pub tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub refund_id: Option<String>,
    pub source_payment_id: Option<String>,
    pub refunded_cents: Option<i64>,
    pub refund_reason: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub recorded_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentRecord> for Payment {
    fn from(r: PaymentRecord) -> Self {
        let refund = match (r.refund_id, r.source_payment_id, r.refunded_at) {
            (Some(refund_id), Some(source_payment_id), Some(refunded_at)) => Some(RefundDetail {
                refund_id,
                source_payment_id,
                refunded_cents: r.refunded_cents.unwrap_or(-r.amount_cents),
                reason: r.refund_reason.unwrap_or_default(),
                refunded_at,
            }),
            _ => None,
        };

        Payment {
            id: r.id,
            order_id: r.order_id,
            amount_cents: r.amount_cents,
            method: r.method,
            status: r.status,
            reference: r.reference,
            card_last4: r.card_last4,
            card_brand: r.card_brand,
            tendered_cents: r.tendered_cents,
            change_cents: r.change_cents,
            refund,
            recorded_by: r.recorded_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// All records for an order in creation order.
pub async fn list_for_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<Payment>> {
    let sql = format!(
        "SELECT {} FROM payments WHERE order_id = ?1 ORDER BY created_at, rowid",
        PAYMENT_COLUMNS
    );
    let records = sqlx::query_as::<_, PaymentRecord>(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(records.into_iter().map(Payment::from).collect())
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Payment>> {
    let sql = format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS);
    let record = sqlx::query_as::<_, PaymentRecord>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(record.map(Payment::from))
}

pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    let refund = payment.refund.as_ref();
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, order_id, amount_cents, method, status, reference,
            card_last4, card_brand, tendered_cents, change_cents,
            refund_id, source_payment_id, refunded_cents, refund_reason, refunded_at,
            recorded_by, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
        )
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.amount_cents)
    .bind(payment.method)
    .bind(payment.status)
    .bind(&payment.reference)
    .bind(&payment.card_last4)
    .bind(&payment.card_brand)
    .bind(payment.tendered_cents)
    .bind(payment.change_cents)
    .bind(refund.map(|r| r.refund_id.clone()))
    .bind(refund.map(|r| r.source_payment_id.clone()))
    .bind(refund.map(|r| r.refunded_cents))
    .bind(refund.map(|r| r.reason.clone()))
    .bind(refund.map(|r| r.refunded_at))
    .bind(&payment.recorded_by)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Updates the settlement fields. Amount, method and refund linkage never
/// change after insert.
pub async fn update(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = ?2,
            reference = ?3,
            card_last4 = ?4,
            card_brand = ?5,
            tendered_cents = ?6,
            change_cents = ?7,
            updated_at = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&payment.id)
    .bind(payment.status)
    .bind(&payment.reference)
    .bind(&payment.card_last4)
    .bind(&payment.card_brand)
    .bind(payment.tendered_cents)
    .bind(payment.change_cents)
    .bind(payment.updated_at)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Payment", &payment.id));
    }
    Ok(())
}

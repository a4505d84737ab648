//! # Product Repository
//!
//! Product rows and the stock counter.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products                                                        │
//! │     SET stock_quantity = stock_quantity - ?qty                          │
//! │   WHERE id = ?id AND stock_quantity >= ?qty                             │
//! │                                                                         │
//! │  rows_affected = 1 → reserved                                           │
//! │  rows_affected = 0 → short (or unknown product), nothing changed        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the write are one statement, so two transactions can never
//! both take the last unit.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use vantage_core::Product;

const PRODUCT_COLUMNS: &str = r#"
    id, name, sku, price_cents, stock_quantity, low_stock_threshold,
    is_active, created_at, updated_at
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        Product {
            id: r.id,
            name: r.name,
            sku: r.sku,
            price_cents: r.price_cents,
            stock_quantity: r.stock_quantity,
            low_stock_threshold: r.low_stock_threshold,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Gets a product by its ID.
pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let record = sqlx::query_as::<_, ProductRecord>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(record.map(Product::from))
}

pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, sku, price_cents, stock_quantity, low_stock_threshold,
            is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price_cents)
    .bind(product.stock_quantity)
    .bind(product.low_stock_threshold)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    debug!(product_id = %product.id, "Product inserted");
    Ok(())
}

/// Subtracts `quantity` only if that much is in stock. Returns whether a
/// row changed.
pub async fn decrement_if_available(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?2,
            updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn increment(conn: &mut SqliteConnection, id: &str, quantity: i64) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }
    Ok(())
}

/// Active products at or below their threshold, lowest stock first.
pub async fn low_stock(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let sql = format!(
        "SELECT {} FROM products \
         WHERE is_active = 1 AND stock_quantity <= low_stock_threshold \
         ORDER BY stock_quantity, name",
        PRODUCT_COLUMNS
    );
    let records = sqlx::query_as::<_, ProductRecord>(&sql)
        .fetch_all(conn)
        .await?;
    Ok(records.into_iter().map(Product::from).collect())
}

pub async fn count(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(conn)
        .await?;
    Ok(count)
}

//! # Customer Repository
//!
//! Customers and their embedded loyalty account.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};
use vantage_core::{Customer, LoyaltyAccount, LoyaltyTier};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub points_balance: i64,
    pub tier: LoyaltyTier,
    pub lifetime_spend_cents: i64,
    pub visit_count: i64,
    pub last_visit_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Customer {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            loyalty: LoyaltyAccount {
                points_balance: r.points_balance,
                tier: r.tier,
                lifetime_spend_cents: r.lifetime_spend_cents,
                visit_count: r.visit_count,
                last_visit_at: r.last_visit_at,
            },
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let record = sqlx::query_as::<_, CustomerRecord>(
        r#"
        SELECT
            id, first_name, last_name, email, phone,
            points_balance, tier, lifetime_spend_cents, visit_count, last_visit_at,
            is_active, created_at, updated_at
        FROM customers
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(record.map(Customer::from))
}

pub async fn insert(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    let loyalty = &customer.loyalty;
    sqlx::query(
        r#"
        INSERT INTO customers (
            id, first_name, last_name, email, phone,
            points_balance, tier, lifetime_spend_cents, visit_count, last_visit_at,
            is_active, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(loyalty.points_balance)
    .bind(loyalty.tier)
    .bind(loyalty.lifetime_spend_cents)
    .bind(loyalty.visit_count)
    .bind(loyalty.last_visit_at)
    .bind(customer.is_active)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes back the loyalty account and contact fields.
pub async fn update(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    let loyalty = &customer.loyalty;
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET first_name = ?2,
            last_name = ?3,
            email = ?4,
            phone = ?5,
            points_balance = ?6,
            tier = ?7,
            lifetime_spend_cents = ?8,
            visit_count = ?9,
            last_visit_at = ?10,
            is_active = ?11,
            updated_at = ?12
        WHERE id = ?1
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(loyalty.points_balance)
    .bind(loyalty.tier)
    .bind(loyalty.lifetime_spend_cents)
    .bind(loyalty.visit_count)
    .bind(loyalty.last_visit_at)
    .bind(customer.is_active)
    .bind(customer.updated_at)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", &customer.id));
    }
    Ok(())
}

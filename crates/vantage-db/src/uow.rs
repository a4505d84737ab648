//! # SQLite Unit of Work
//!
//! [`UnitOfWork`] over one SQLite transaction.
//!
//! ```text
//! Database::begin()  ──► BEGIN
//!      │
//!      ├── repository calls on &mut *tx
//!      │
//!      ├── commit()  ──► COMMIT
//!      └── drop      ──► ROLLBACK (sqlx rolls back unfinished transactions)
//! ```

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, warn};

use vantage_core::ports::UnitOfWork;
use vantage_core::{CoreError, CoreResult, Customer, Order, Payment, Product};

use crate::error::DbError;
use crate::repository::order::UpdateOutcome;
use crate::repository::{customer, order, payment, product};

pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteUnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        SqliteUnitOfWork { tx }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn product(&mut self, id: &str) -> CoreResult<Option<Product>> {
        Ok(product::get_by_id(&mut self.tx, id).await?)
    }

    async fn insert_product(&mut self, p: &Product) -> CoreResult<()> {
        Ok(product::insert(&mut self.tx, p).await?)
    }

    async fn decrement_stock_if_available(&mut self, id: &str, quantity: i64) -> CoreResult<bool> {
        Ok(product::decrement_if_available(&mut self.tx, id, quantity).await?)
    }

    async fn increment_stock(&mut self, id: &str, quantity: i64) -> CoreResult<()> {
        Ok(product::increment(&mut self.tx, id, quantity).await?)
    }

    async fn low_stock_products(&mut self) -> CoreResult<Vec<Product>> {
        Ok(product::low_stock(&mut self.tx).await?)
    }

    async fn order(&mut self, id: &str) -> CoreResult<Option<Order>> {
        Ok(order::get_by_id(&mut self.tx, id).await?)
    }

    async fn insert_order(&mut self, o: &Order) -> CoreResult<()> {
        Ok(order::insert(&mut self.tx, o).await?)
    }

    async fn update_order(&mut self, o: &mut Order) -> CoreResult<()> {
        match order::update_versioned(&mut self.tx, o).await? {
            UpdateOutcome::Updated => {
                o.version += 1;
                Ok(())
            }
            UpdateOutcome::Stale => {
                warn!(order_id = %o.id, version = o.version, "Stale order update");
                Err(CoreError::Conflict(format!(
                    "order {} was modified concurrently",
                    o.id
                )))
            }
        }
    }

    async fn payments_for_order(&mut self, order_id: &str) -> CoreResult<Vec<Payment>> {
        Ok(payment::list_for_order(&mut self.tx, order_id).await?)
    }

    async fn payment(&mut self, id: &str) -> CoreResult<Option<Payment>> {
        Ok(payment::get_by_id(&mut self.tx, id).await?)
    }

    async fn insert_payment(&mut self, p: &Payment) -> CoreResult<()> {
        if order::get_by_id(&mut self.tx, &p.order_id).await?.is_none() {
            return Err(CoreError::not_found("Order", &p.order_id));
        }
        Ok(payment::insert(&mut self.tx, p).await?)
    }

    async fn update_payment(&mut self, p: &Payment) -> CoreResult<()> {
        Ok(payment::update(&mut self.tx, p).await?)
    }

    async fn customer(&mut self, id: &str) -> CoreResult<Option<Customer>> {
        Ok(customer::get_by_id(&mut self.tx, id).await?)
    }

    async fn insert_customer(&mut self, c: &Customer) -> CoreResult<()> {
        Ok(customer::insert(&mut self.tx, c).await?)
    }

    async fn save_customer(&mut self, c: &Customer) -> CoreResult<()> {
        Ok(customer::update(&mut self.tx, c).await?)
    }

    async fn commit(self) -> CoreResult<()> {
        self.tx.commit().await.map_err(DbError::from)?;
        debug!("Transaction committed");
        Ok(())
    }
}

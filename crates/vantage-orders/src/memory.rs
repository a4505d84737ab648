//! # In-Memory Store
//!
//! A [`Store`] backed by plain collections, used by tests and demos.
//!
//! Units of work are serialized behind one async mutex. Each unit of work
//! edits a private copy of the tables; `commit` swaps the copy in, and
//! dropping it discards the copy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::{CoreError, CoreResult, Customer, Order, Payment, Product};

#[derive(Debug, Clone, Default)]
struct Tables {
    products: HashMap<String, Product>,
    orders: HashMap<String, Order>,
    /// Insertion order is creation order.
    payments: Vec<Payment>,
    customers: HashMap<String, Customer>,
}

/// Shared in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product outside any unit of work.
    pub async fn seed_product(&self, product: Product) {
        let mut tables = self.tables.lock().await;
        tables.products.insert(product.id.clone(), product);
    }

    /// Inserts or replaces a customer outside any unit of work.
    pub async fn seed_customer(&self, customer: Customer) {
        let mut tables = self.tables.lock().await;
        tables.customers.insert(customer.id.clone(), customer);
    }

    /// Committed state of a product.
    pub async fn product_snapshot(&self, id: &str) -> Option<Product> {
        self.tables.lock().await.products.get(id).cloned()
    }

    /// Committed state of a customer.
    pub async fn customer_snapshot(&self, id: &str) -> Option<Customer> {
        self.tables.lock().await.customers.get(id).cloned()
    }

    /// Number of committed payment records for an order.
    pub async fn payment_count(&self, order_id: &str) -> usize {
        self.tables
            .lock()
            .await
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .count()
    }

    /// Number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.tables.lock().await.orders.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> CoreResult<MemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = Tables::clone(&guard);
        Ok(MemoryTx { guard, staged })
    }
}

/// Unit of work over a private copy of the tables.
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl MemoryTx {
    fn product_mut(&mut self, id: &str) -> CoreResult<&mut Product> {
        self.staged
            .products
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("Product", id))
    }
}

#[async_trait]
impl UnitOfWork for MemoryTx {
    async fn product(&mut self, id: &str) -> CoreResult<Option<Product>> {
        Ok(self.staged.products.get(id).cloned())
    }

    async fn insert_product(&mut self, product: &Product) -> CoreResult<()> {
        if self.staged.products.contains_key(&product.id) {
            return Err(CoreError::Conflict(format!("product {} already exists", product.id)));
        }
        self.staged.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn decrement_stock_if_available(&mut self, id: &str, quantity: i64) -> CoreResult<bool> {
        match self.staged.products.get_mut(id) {
            Some(product) if product.stock_quantity >= quantity => {
                product.stock_quantity -= quantity;
                product.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_stock(&mut self, id: &str, quantity: i64) -> CoreResult<()> {
        let product = self.product_mut(id)?;
        product.stock_quantity += quantity;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn low_stock_products(&mut self) -> CoreResult<Vec<Product>> {
        let mut low: Vec<Product> = self
            .staged
            .products
            .values()
            .filter(|p| p.is_active && p.is_low_stock())
            .cloned()
            .collect();
        low.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then(a.name.cmp(&b.name)));
        Ok(low)
    }

    async fn order(&mut self, id: &str) -> CoreResult<Option<Order>> {
        Ok(self.staged.orders.get(id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> CoreResult<()> {
        if self.staged.orders.contains_key(&order.id) {
            return Err(CoreError::Conflict(format!("order {} already exists", order.id)));
        }
        self.staged.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &mut Order) -> CoreResult<()> {
        let stored = self
            .staged
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| CoreError::not_found("Order", &order.id))?;

        if stored.version != order.version {
            return Err(CoreError::Conflict(format!(
                "order {} was modified concurrently",
                order.id
            )));
        }

        order.version += 1;
        let lines = std::mem::take(&mut stored.lines);
        *stored = Order {
            lines,
            ..order.clone()
        };
        Ok(())
    }

    async fn payments_for_order(&mut self, order_id: &str) -> CoreResult<Vec<Payment>> {
        Ok(self
            .staged
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn payment(&mut self, id: &str) -> CoreResult<Option<Payment>> {
        Ok(self.staged.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> CoreResult<()> {
        if !self.staged.orders.contains_key(&payment.order_id) {
            return Err(CoreError::not_found("Order", &payment.order_id));
        }
        self.staged.payments.push(payment.clone());
        Ok(())
    }

    async fn update_payment(&mut self, payment: &Payment) -> CoreResult<()> {
        let stored = self
            .staged
            .payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| CoreError::not_found("Payment", &payment.id))?;
        *stored = payment.clone();
        Ok(())
    }

    async fn customer(&mut self, id: &str) -> CoreResult<Option<Customer>> {
        Ok(self.staged.customers.get(id).cloned())
    }

    async fn insert_customer(&mut self, customer: &Customer) -> CoreResult<()> {
        if self.staged.customers.contains_key(&customer.id) {
            return Err(CoreError::Conflict(format!("customer {} already exists", customer.id)));
        }
        self.staged
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn save_customer(&mut self, customer: &Customer) -> CoreResult<()> {
        let stored = self
            .staged
            .customers
            .get_mut(&customer.id)
            .ok_or_else(|| CoreError::not_found("Customer", &customer.id))?;
        *stored = customer.clone();
        Ok(())
    }

    async fn commit(self) -> CoreResult<()> {
        let MemoryTx { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::Money;

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let store = MemoryStore::new();
        store
            .seed_product(Product::new("p-1", "Mug", Money::from_cents(500), 3))
            .await;

        {
            let mut tx = store.begin().await.unwrap();
            assert!(tx.decrement_stock_if_available("p-1", 2).await.unwrap());
            assert_eq!(tx.product("p-1").await.unwrap().unwrap().stock_quantity, 1);
        }

        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        store
            .seed_product(Product::new("p-1", "Mug", Money::from_cents(500), 3))
            .await;

        let mut tx = store.begin().await.unwrap();
        assert!(!tx.decrement_stock_if_available("p-1", 4).await.unwrap());
        assert!(tx.decrement_stock_if_available("p-1", 3).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 0);
    }
}

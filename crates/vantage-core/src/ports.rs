//! # Persistence Ports
//!
//! The only way the order workflow reaches storage. Services receive a
//! [`Store`] at construction; every operation opens one [`UnitOfWork`],
//! does its reads and writes through it, and commits.
//!
//! ## Transaction Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut tx = store.begin().await?;                                     │
//! │       │                                                                 │
//! │       ├── reads see this transaction's own writes                       │
//! │       ├── decrement_stock_if_available: one conditional write           │
//! │       ├── update_order: fails with Conflict on a stale version          │
//! │       │                                                                 │
//! │       ├── tx.commit().await?   → all writes become visible together     │
//! │       └── drop(tx) / error     → nothing is written                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a unit of work without committing is a rollback. A request
//! future cancelled mid-flight therefore leaves no partial order behind.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Customer, Order, Payment, Product};

/// A source of units of work.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> CoreResult<Self::Tx>;

    /// Cheap liveness check for health endpoints.
    async fn health_check(&self) -> bool {
        true
    }
}

/// Transactional access to products, orders, payments and customers.
#[async_trait]
pub trait UnitOfWork: Send {
    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    async fn product(&mut self, id: &str) -> CoreResult<Option<Product>>;

    async fn insert_product(&mut self, product: &Product) -> CoreResult<()>;

    /// Atomically subtracts `quantity` if at least that much is in stock.
    ///
    /// Returns `false` (and changes nothing) when stock is short or the
    /// product does not exist. Must be a single conditional write, never a
    /// read followed by a write.
    async fn decrement_stock_if_available(&mut self, id: &str, quantity: i64) -> CoreResult<bool>;

    /// Adds `quantity` back to stock.
    async fn increment_stock(&mut self, id: &str, quantity: i64) -> CoreResult<()>;

    /// Active products at or below their low-stock threshold.
    async fn low_stock_products(&mut self) -> CoreResult<Vec<Product>>;

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Loads an order with its lines.
    async fn order(&mut self, id: &str) -> CoreResult<Option<Order>>;

    /// Inserts an order and its lines.
    async fn insert_order(&mut self, order: &Order) -> CoreResult<()>;

    /// Writes the order header if the stored version still equals
    /// `order.version`, then bumps `order.version`.
    ///
    /// Fails with `CoreError::Conflict` when another writer got there first.
    async fn update_order(&mut self, order: &mut Order) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// All payment records of an order, oldest first.
    async fn payments_for_order(&mut self, order_id: &str) -> CoreResult<Vec<Payment>>;

    async fn payment(&mut self, id: &str) -> CoreResult<Option<Payment>>;

    async fn insert_payment(&mut self, payment: &Payment) -> CoreResult<()>;

    /// Updates status and settlement fields of an existing payment.
    async fn update_payment(&mut self, payment: &Payment) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    async fn customer(&mut self, id: &str) -> CoreResult<Option<Customer>>;

    async fn insert_customer(&mut self, customer: &Customer) -> CoreResult<()>;

    /// Persists the customer's loyalty account.
    async fn save_customer(&mut self, customer: &Customer) -> CoreResult<()>;

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    async fn commit(self) -> CoreResult<()>;
}

//! # Inventory Ledger
//!
//! Stock reservation and release.
//!
//! ## Reservation Flow
//! ```text
//! reserve(product, qty)
//!      │
//!      ├── qty < 1                      → InvalidQuantity
//!      ├── product missing / inactive   → NotFound
//!      │
//!      ▼
//! UPDATE stock = stock − qty WHERE stock ≥ qty   (single conditional write)
//!      │
//!      ├── 0 rows → InsufficientStock { available, requested }
//!      └── 1 row  → Reservation { unit_price frozen now }
//! ```
//!
//! Two concurrent reservations of the same product can never both succeed
//! past the available stock, because the check and the decrement are one
//! statement.
//!
//! Manual adjustments (`adjust_stock`) go through the same two writes: an
//! `Add` is a plain increment, a `Remove` is the conditional decrement and
//! fails with `InsufficientStock` rather than driving stock negative.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::validation::{validate_id, validate_line_quantity};
use vantage_core::{CoreError, CoreResult, Money, Product, MAX_STOCK_ADJUSTMENT};

/// Stock taken for one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub product_id: String,
    /// Product name at reservation time.
    pub name: String,
    /// Unit price at reservation time.
    pub unit_price: Money,
    pub quantity: i64,
}

/// A product and quantity to reserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl StockRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        StockRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Direction of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAdjustment {
    /// Goods received.
    Add,
    /// Shrinkage, damage or a manual count correction.
    Remove,
}

/// Reserves and releases stock through the persistence port.
pub struct InventoryLedger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for InventoryLedger<S> {
    fn clone(&self) -> Self {
        InventoryLedger {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> InventoryLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        InventoryLedger { store }
    }

    /// Reserves stock in its own unit of work.
    pub async fn reserve(&self, product_id: &str, quantity: i64) -> CoreResult<Reservation> {
        let mut tx = self.store.begin().await?;
        let reservation = self.reserve_in(&mut tx, product_id, quantity).await?;
        tx.commit().await?;
        Ok(reservation)
    }

    /// Releases stock in its own unit of work.
    pub async fn release(&self, product_id: &str, quantity: i64) -> CoreResult<()> {
        let mut tx = self.store.begin().await?;
        self.release_in(&mut tx, product_id, quantity).await?;
        tx.commit().await
    }

    /// Reserves every request or none of them.
    pub async fn reserve_all(&self, requests: &[StockRequest]) -> CoreResult<Vec<Reservation>> {
        let mut tx = self.store.begin().await?;
        let reservations = self.reserve_all_in(&mut tx, requests).await?;
        tx.commit().await?;
        Ok(reservations)
    }

    /// Manually adds or removes stock and returns the updated product.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        quantity: i64,
        kind: StockAdjustment,
    ) -> CoreResult<Product> {
        validate_id("product_id", product_id)?;
        if !(1..=MAX_STOCK_ADJUSTMENT).contains(&quantity) {
            return Err(CoreError::InvalidQuantity { quantity });
        }

        let mut tx = self.store.begin().await?;
        let before = tx
            .product(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        match kind {
            StockAdjustment::Add => tx.increment_stock(product_id, quantity).await?,
            StockAdjustment::Remove => {
                if !tx.decrement_stock_if_available(product_id, quantity).await? {
                    warn!(
                        product_id = %product_id,
                        available = before.stock_quantity,
                        requested = quantity,
                        "Stock removal rejected: insufficient stock"
                    );
                    return Err(CoreError::InsufficientStock {
                        product_id: product_id.to_string(),
                        available: before.stock_quantity,
                        requested: quantity,
                    });
                }
            }
        }

        let product = tx
            .product(product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;
        tx.commit().await?;

        info!(
            product_id = %product_id,
            adjustment = ?kind,
            quantity,
            from = before.stock_quantity,
            to = product.stock_quantity,
            "Stock adjusted"
        );
        Ok(product)
    }

    /// Active products at or below their low-stock threshold.
    pub async fn low_stock(&self) -> CoreResult<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        let products = tx.low_stock_products().await?;
        debug!(count = products.len(), "Low stock products loaded");
        Ok(products)
    }

    pub async fn reserve_in(
        &self,
        tx: &mut S::Tx,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<Reservation> {
        validate_id("product_id", product_id)?;
        validate_line_quantity(quantity)?;

        let product = tx
            .product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        if !tx.decrement_stock_if_available(product_id, quantity).await? {
            warn!(
                product_id = %product_id,
                available = product.stock_quantity,
                requested = quantity,
                "Reservation rejected: insufficient stock"
            );
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available: product.stock_quantity,
                requested: quantity,
            });
        }

        debug!(product_id = %product_id, quantity, "Stock reserved");

        Ok(Reservation {
            product_id: product.id,
            unit_price: Money::from_cents(product.price_cents),
            name: product.name,
            quantity,
        })
    }

    pub async fn release_in(&self, tx: &mut S::Tx, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { quantity });
        }
        tx.increment_stock(product_id, quantity).await?;
        debug!(product_id = %product_id, quantity, "Stock released");
        Ok(())
    }

    /// Reserves each request in order. On the first failure every earlier
    /// reservation is released, newest first, and the failure is returned.
    pub async fn reserve_all_in(
        &self,
        tx: &mut S::Tx,
        requests: &[StockRequest],
    ) -> CoreResult<Vec<Reservation>> {
        let mut reserved: Vec<Reservation> = Vec::with_capacity(requests.len());

        for request in requests {
            match self.reserve_in(tx, &request.product_id, request.quantity).await {
                Ok(reservation) => reserved.push(reservation),
                Err(err) => {
                    for done in reserved.iter().rev() {
                        self.release_in(tx, &done.product_id, done.quantity).await?;
                    }
                    if !reserved.is_empty() {
                        info!(
                            released = reserved.len(),
                            failed_product = %request.product_id,
                            "Rolled back partial reservation"
                        );
                    }
                    return Err(err);
                }
            }
        }

        Ok(reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn ledger_with(products: Vec<Product>) -> (Arc<MemoryStore>, InventoryLedger<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for product in products {
            store.seed_product(product).await;
        }
        (store.clone(), InventoryLedger::new(store))
    }

    #[tokio::test]
    async fn test_reserve_decrements_and_freezes_price() {
        let (store, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 5)]).await;

        let reservation = ledger.reserve("p-1", 3).await.unwrap();

        assert_eq!(reservation.unit_price.cents(), 1000);
        assert_eq!(reservation.name, "Mug");
        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_failed_reserve_leaves_stock_unchanged() {
        let (store, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 2)]).await;

        let err = ledger.reserve("p-1", 3).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));
        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_reserve_rejects_bad_input() {
        let mut inactive = Product::new("p-2", "Old", Money::from_cents(100), 9);
        inactive.is_active = false;
        let (_, ledger) = ledger_with(vec![inactive]).await;

        assert!(matches!(
            ledger.reserve("p-2", 0).await,
            Err(CoreError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(ledger.reserve("p-2", 1).await, Err(CoreError::NotFound { .. })));
        assert!(matches!(ledger.reserve("nope", 1).await, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let (store, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 5)]).await;

        ledger.reserve("p-1", 5).await.unwrap();
        ledger.release("p-1", 5).await.unwrap();

        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_reserve_all_compensates_on_failure() {
        let (store, ledger) = ledger_with(vec![
            Product::new("p-1", "Mug", Money::from_cents(1000), 10),
            Product::new("p-2", "Tea", Money::from_cents(400), 1),
        ])
        .await;

        let err = ledger
            .reserve_all(&[StockRequest::new("p-1", 4), StockRequest::new("p-2", 2)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { ref product_id, .. } if product_id == "p-2"
        ));
        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 10);
        assert_eq!(store.product_snapshot("p-2").await.unwrap().stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_oversell() {
        let (store, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 5)]).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.reserve("p-1", 1).await }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_adds_and_removes() {
        let (store, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 5)]).await;

        let added = ledger.adjust_stock("p-1", 20, StockAdjustment::Add).await.unwrap();
        assert_eq!(added.stock_quantity, 25);

        let removed = ledger.adjust_stock("p-1", 24, StockAdjustment::Remove).await.unwrap();
        assert_eq!(removed.stock_quantity, 1);
        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 1);
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let (store, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 3)]).await;

        let err = ledger
            .adjust_stock("p-1", 4, StockAdjustment::Remove)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 4, .. }
        ));
        assert_eq!(store.product_snapshot("p-1").await.unwrap().stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_bad_input() {
        let (_, ledger) =
            ledger_with(vec![Product::new("p-1", "Mug", Money::from_cents(1000), 3)]).await;

        assert!(matches!(
            ledger.adjust_stock("p-1", 0, StockAdjustment::Add).await,
            Err(CoreError::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            ledger.adjust_stock("p-1", -2, StockAdjustment::Remove).await,
            Err(CoreError::InvalidQuantity { quantity: -2 })
        ));
        assert!(matches!(
            ledger
                .adjust_stock("p-1", MAX_STOCK_ADJUSTMENT + 1, StockAdjustment::Add)
                .await,
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            ledger.adjust_stock("nope", 1, StockAdjustment::Add).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_stock_adjustment_wire_names() {
        let kind: StockAdjustment = serde_json::from_str("\"remove\"").unwrap();
        assert_eq!(kind, StockAdjustment::Remove);
        assert_eq!(serde_json::to_string(&StockAdjustment::Add).unwrap(), "\"add\"");
    }

    #[tokio::test]
    async fn test_low_stock_lists_active_products_at_threshold() {
        let mut quiet = Product::new("p-3", "Gone", Money::from_cents(100), 0);
        quiet.is_active = false;
        let (_, ledger) = ledger_with(vec![
            Product::new("p-1", "Mug", Money::from_cents(1000), 10),
            Product::new("p-2", "Tea", Money::from_cents(400), 50),
            quiet,
        ])
        .await;

        let low = ledger.low_stock().await.unwrap();

        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "p-1");
    }
}

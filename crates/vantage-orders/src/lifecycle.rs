//! # Order Lifecycle
//!
//! Applies status transitions together with their side effects.
//!
//! ## Effects
//! ```text
//! ┌─────────────┬───────────────────────────────────────────────────────────┐
//! │ → CANCELLED │ rejected while any completed payment is unrefunded       │
//! │             │ release stock for every line (once)                      │
//! │             │ restore redeemed loyalty points                          │
//! │             │ fail still-pending payments                              │
//! ├─────────────┼───────────────────────────────────────────────────────────┤
//! │ → COMPLETED │ accrue loyalty on total minus points-funded payments     │
//! │             │ stamp completed_at and loyalty_points_earned             │
//! ├─────────────┼───────────────────────────────────────────────────────────┤
//! │ → REFUNDED  │ reached through the payment ledger only                  │
//! │             │ from PENDING/PROCESSING: same release as CANCELLED       │
//! │             │ from COMPLETED: none (goods already handed over)         │
//! │ → PROCESSING│ none                                                     │
//! └─────────────┴───────────────────────────────────────────────────────────┘
//! ```
//!
//! All effects and the status write share one unit of work, and the status
//! write is version-checked. A cancellation racing a payment completion
//! therefore fails one side with `Conflict` instead of interleaving.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use vantage_core::lifecycle::check_transition;
use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::settlement::{is_fully_paid, PaymentSummary};
use vantage_core::{CoreError, CoreResult, Order, OrderStatus, PaymentStatus, Principal};

use crate::inventory::InventoryLedger;
use crate::loyalty::LoyaltyProgram;

pub struct OrderLifecycle<S: Store> {
    store: Arc<S>,
    inventory: InventoryLedger<S>,
    loyalty: LoyaltyProgram<S>,
}

impl<S: Store> Clone for OrderLifecycle<S> {
    fn clone(&self) -> Self {
        OrderLifecycle {
            store: self.store.clone(),
            inventory: self.inventory.clone(),
            loyalty: self.loyalty.clone(),
        }
    }
}

impl<S: Store> OrderLifecycle<S> {
    pub fn new(store: Arc<S>, inventory: InventoryLedger<S>, loyalty: LoyaltyProgram<S>) -> Self {
        OrderLifecycle {
            store,
            inventory,
            loyalty,
        }
    }

    /// Moves an order to the status named by `status`.
    ///
    /// ## Errors
    /// - `InvalidStatus` if `status` is not a known status name
    /// - `NotFound` if the order does not exist
    /// - `InvalidTransition` if the table forbids the move, if REFUNDED is
    ///   requested directly, or if COMPLETED is requested with a balance due
    pub async fn transition_status(
        &self,
        order_id: &str,
        status: &str,
        principal: &Principal,
    ) -> CoreResult<Order> {
        let to: OrderStatus = status.parse()?;

        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, order_id).await?;

        match to {
            OrderStatus::Refunded => {
                warn!(order_id = %order_id, "Refund status must come from a recorded refund");
                return Err(invalid(&order, to));
            }
            OrderStatus::Completed => {
                let payments = tx.payments_for_order(order_id).await?;
                if !is_fully_paid(&order, &payments) {
                    warn!(order_id = %order_id, "Cannot complete an order with a balance due");
                    return Err(invalid(&order, to));
                }
            }
            _ => {}
        }

        self.apply_in(&mut tx, &mut order, to, Utc::now()).await?;
        tx.commit().await?;

        info!(
            order_id = %order_id,
            status = %order.status,
            principal_id = %principal.id,
            "Order status changed"
        );
        Ok(order)
    }

    /// Checks the transition, runs its effects and writes the new status.
    pub async fn apply_in(
        &self,
        tx: &mut S::Tx,
        order: &mut Order,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        check_transition(order, to)?;

        match to {
            OrderStatus::Cancelled => self.cancel_effects(tx, order, at).await?,
            OrderStatus::Completed => self.complete_effects(tx, order, at).await?,
            // Refunded before it was ever fulfilled: the goods never left.
            OrderStatus::Refunded if order.status.is_open() => {
                self.unwind_effects(tx, order, at).await?
            }
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Refunded => {}
        }

        let from = order.status;
        order.status = to;
        order.updated_at = at;
        tx.update_order(order).await?;

        info!(order_id = %order.id, from = %from, to = %to, "Order transitioned");
        Ok(())
    }

    async fn cancel_effects(&self, tx: &mut S::Tx, order: &Order, at: DateTime<Utc>) -> CoreResult<()> {
        let payments = tx.payments_for_order(&order.id).await?;
        let summary = PaymentSummary::of(&payments);
        if summary.refundable().is_positive() {
            warn!(
                order_id = %order.id,
                paid = %summary.refundable(),
                "Cancellation rejected: refund completed payments first"
            );
            return Err(invalid(order, OrderStatus::Cancelled));
        }

        self.unwind_effects(tx, order, at).await
    }

    /// Restocks every line, returns redeemed points and fails pending
    /// payments. Runs once, on the move out of an open status.
    async fn unwind_effects(&self, tx: &mut S::Tx, order: &Order, at: DateTime<Utc>) -> CoreResult<()> {
        let payments = tx.payments_for_order(&order.id).await?;

        for line in &order.lines {
            self.inventory
                .release_in(tx, &line.product_id, line.quantity)
                .await?;
        }

        self.loyalty
            .restore_in(tx, &order.customer_id, order.loyalty_points_redeemed)
            .await?;

        for mut payment in payments
            .into_iter()
            .filter(|p| p.status == PaymentStatus::Pending)
        {
            payment.status = PaymentStatus::Failed;
            payment.updated_at = at;
            tx.update_payment(&payment).await?;
        }

        Ok(())
    }

    async fn complete_effects(&self, tx: &mut S::Tx, order: &mut Order, at: DateTime<Utc>) -> CoreResult<()> {
        let payments = tx.payments_for_order(&order.id).await?;
        let points_funded = PaymentSummary::of(&payments).points_funded;
        let spend = order.total().saturating_sub_floor(points_funded);

        order.loyalty_points_earned = self
            .loyalty
            .accrue_in(tx, &order.customer_id, spend, at)
            .await?;
        order.completed_at = Some(at);
        Ok(())
    }
}

fn invalid(order: &Order, to: OrderStatus) -> CoreError {
    CoreError::InvalidTransition {
        order_id: order.id.clone(),
        from: order.status,
        to,
    }
}

pub(crate) async fn load_order<T: UnitOfWork>(tx: &mut T, order_id: &str) -> CoreResult<Order> {
    tx.order(order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))
}

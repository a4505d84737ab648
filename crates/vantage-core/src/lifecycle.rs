//! # Order State Machine
//!
//! The transition table for [`OrderStatus`]. Side effects (stock release,
//! loyalty accrual) are applied by the order service; this module only
//! decides whether a move is legal.
//!
//! ```text
//! ┌─────────────┬────────────┬───────────┬───────────┬──────────┐
//! │ from \ to   │ PROCESSING │ COMPLETED │ CANCELLED │ REFUNDED │
//! ├─────────────┼────────────┼───────────┼───────────┼──────────┤
//! │ PENDING     │     ✓      │     ✓     │     ✓     │    ✓     │
//! │ PROCESSING  │            │     ✓     │     ✓     │    ✓     │
//! │ COMPLETED   │            │           │           │    ✓     │
//! │ CANCELLED   │            │           │           │          │
//! │ REFUNDED    │            │           │           │          │
//! └─────────────┴────────────┴───────────┴───────────┴──────────┘
//! ```
//!
//! Same-state moves are never legal, so cancelling twice is an error rather
//! than a second stock release.

use crate::error::{CoreError, CoreResult};
use crate::types::{Order, OrderStatus};

/// Whether `from → to` appears in the table.
pub const fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Completed)
            | (Pending, Cancelled)
            | (Pending, Refunded)
            | (Processing, Completed)
            | (Processing, Cancelled)
            | (Processing, Refunded)
            | (Completed, Refunded)
    )
}

/// Fails with `InvalidTransition` unless the order may move to `to`.
pub fn check_transition(order: &Order, to: OrderStatus) -> CoreResult<()> {
    if can_transition(order.status, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            order_id: order.id.clone(),
            from: order.status,
            to,
        })
    }
}

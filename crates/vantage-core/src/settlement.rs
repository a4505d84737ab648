//! # Settlement Math
//!
//! Pure checks over an order's payment records: the payment cap, the
//! refund cap and greedy refund allocation.
//!
//! ## Payment Records
//! ```text
//! ┌──────────┬──────────┬───────────┬──────────────────────────────────────┐
//! │ status   │ amount   │ refund?   │ counts as                            │
//! ├──────────┼──────────┼───────────┼──────────────────────────────────────┤
//! │ PENDING  │ > 0      │ no        │ nothing yet                          │
//! │ COMPLETED│ > 0      │ no        │ paid                                 │
//! │ FAILED   │ > 0      │ no        │ nothing                              │
//! │ REFUNDED │ < 0      │ yes       │ refunded (against source payment)    │
//! └──────────┴──────────┴───────────┴──────────────────────────────────────┘
//! ```
//!
//! Invariants kept by the checks here:
//! - completed ≤ order total
//! - refunded ≤ completed

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Order, Payment, PaymentMethod, PaymentStatus};
use crate::validation::{amount_out_of_range, validate_payment_amount};

// =============================================================================
// Summary
// =============================================================================

/// Totals over an order's payment records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentSummary {
    /// Sum of COMPLETED payments.
    pub completed: Money,
    /// Sum of refund records, as a positive amount.
    pub refunded: Money,
    /// Sum of PENDING payments.
    pub pending: Money,
    /// Completed payments funded by loyalty points.
    pub points_funded: Money,
}

impl PaymentSummary {
    pub fn of(payments: &[Payment]) -> Self {
        payments.iter().fold(PaymentSummary::default(), |mut acc, p| {
            if p.is_refund() {
                acc.refunded += p.amount().abs();
                return acc;
            }
            match p.status {
                PaymentStatus::Completed => {
                    acc.completed += p.amount();
                    if p.method == PaymentMethod::LoyaltyPoints {
                        acc.points_funded += p.amount();
                    }
                }
                PaymentStatus::Pending => acc.pending += p.amount(),
                PaymentStatus::Failed | PaymentStatus::Refunded => {}
            }
            acc
        })
    }

    /// Completed minus already refunded.
    pub fn refundable(&self) -> Money {
        self.completed - self.refunded
    }

    /// Every completed payment has been refunded.
    pub fn is_fully_refunded(&self) -> bool {
        self.completed.is_positive() && self.refunded >= self.completed
    }
}

/// `max(0, total − completed)`.
pub fn remaining_balance(order: &Order, payments: &[Payment]) -> Money {
    order
        .total()
        .saturating_sub_floor(PaymentSummary::of(payments).completed)
}

/// Completed payments cover the order total.
pub fn is_fully_paid(order: &Order, payments: &[Payment]) -> bool {
    PaymentSummary::of(payments).completed >= order.total()
}

// =============================================================================
// Payment Cap
// =============================================================================

/// Checks that `amount` can be recorded (or completed) against the order.
///
/// ```text
/// amount ≤ 0                         → Validation
/// order not PENDING/PROCESSING       → OrderClosed
/// completed + amount > total         → ExceedsOrderTotal
/// ```
pub fn check_payment(order: &Order, payments: &[Payment], amount: Money) -> CoreResult<()> {
    validate_payment_amount(amount.cents())?;

    if !order.status.is_open() {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status,
        });
    }

    let completed = PaymentSummary::of(payments).completed;
    let after = completed
        .checked_add(amount)
        .ok_or_else(|| amount_out_of_range("amount"))?;
    if after > order.total() {
        return Err(CoreError::ExceedsOrderTotal {
            order_id: order.id.clone(),
            requested: amount,
            remaining: order.total().saturating_sub_floor(completed),
        });
    }

    Ok(())
}

/// Checks that a PENDING payment may be marked COMPLETED.
pub fn check_completion(order: &Order, payments: &[Payment], payment: &Payment) -> CoreResult<()> {
    if payment.status != PaymentStatus::Pending || payment.is_refund() {
        return Err(CoreError::InvalidPaymentState {
            payment_id: payment.id.clone(),
            status: payment.status,
        });
    }

    check_payment(order, payments, payment.amount())
}

// =============================================================================
// Refund Allocation
// =============================================================================

/// One slice of a refund, taken from a single completed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundAllocation {
    pub source_payment_id: String,
    pub method: PaymentMethod,
    /// Positive amount refunded from the source.
    pub amount: Money,
}

/// Splits a refund across completed payments, oldest first.
///
/// Each source contributes at most what has not already been refunded from
/// it. `payments` must be in creation order.
///
/// ```text
/// payments: A $20 (refunded $5), B $13
/// refund $25 → A $15, B $10
/// ```
pub fn plan_refund(
    order: &Order,
    payments: &[Payment],
    amount: Money,
) -> CoreResult<Vec<RefundAllocation>> {
    if !amount.is_positive() {
        return Err(CoreError::InvalidRefundAmount { amount });
    }

    let summary = PaymentSummary::of(payments);
    let refundable = summary.refundable();
    if amount > refundable {
        return Err(CoreError::ExceedsPaidAmount {
            order_id: order.id.clone(),
            requested: amount,
            refundable,
        });
    }

    let mut already_refunded: HashMap<&str, Money> = HashMap::new();
    for detail in payments.iter().filter_map(|p| p.refund.as_ref()) {
        *already_refunded
            .entry(detail.source_payment_id.as_str())
            .or_default() += Money::from_cents(detail.refunded_cents);
    }

    let mut outstanding = amount;
    let mut plan = Vec::new();

    let sources = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed && !p.is_refund());

    for source in sources {
        if !outstanding.is_positive() {
            break;
        }
        let used = already_refunded
            .get(source.id.as_str())
            .copied()
            .unwrap_or_default();
        let available = source.amount().saturating_sub_floor(used);
        if !available.is_positive() {
            continue;
        }

        let slice = available.min(outstanding);
        plan.push(RefundAllocation {
            source_payment_id: source.id.clone(),
            method: source.method,
            amount: slice,
        });
        outstanding -= slice;
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderStatus, RefundDetail};
    use chrono::{Duration, Utc};

    fn order(total: i64) -> Order {
        let now = Utc::now();
        Order {
            id: "o-1".to_string(),
            customer_id: "c-1".to_string(),
            cashier_id: None,
            status: OrderStatus::Pending,
            lines: vec![],
            subtotal_cents: total,
            discount_kind: None,
            discount_value: 0,
            discount_cents: 0,
            tax_rate_bps: 0,
            tax_cents: 0,
            shipping_cents: 0,
            total_cents: total,
            is_online: false,
            shipping_address: None,
            loyalty_points_earned: 0,
            loyalty_points_redeemed: 0,
            notes: None,
            version: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn payment(id: &str, cents: i64, status: PaymentStatus, minutes: i64) -> Payment {
        let at = Utc::now() + Duration::minutes(minutes);
        Payment {
            id: id.to_string(),
            order_id: "o-1".to_string(),
            amount_cents: cents,
            method: PaymentMethod::Cash,
            status,
            reference: None,
            card_last4: None,
            card_brand: None,
            tendered_cents: None,
            change_cents: None,
            refund: None,
            recorded_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn refund_of(source: &str, cents: i64) -> Payment {
        let mut p = payment(&format!("r-{}", source), -cents, PaymentStatus::Refunded, 10);
        p.refund = Some(RefundDetail {
            refund_id: "REF-1".to_string(),
            source_payment_id: source.to_string(),
            refunded_cents: cents,
            reason: "test".to_string(),
            refunded_at: p.created_at,
        });
        p
    }

    #[test]
    fn test_summary_buckets() {
        let payments = vec![
            payment("a", 2000, PaymentStatus::Completed, 0),
            payment("b", 500, PaymentStatus::Pending, 1),
            payment("c", 700, PaymentStatus::Failed, 2),
            refund_of("a", 300),
        ];
        let summary = PaymentSummary::of(&payments);

        assert_eq!(summary.completed.cents(), 2000);
        assert_eq!(summary.pending.cents(), 500);
        assert_eq!(summary.refunded.cents(), 300);
        assert_eq!(summary.refundable().cents(), 1700);
    }

    #[test]
    fn test_split_tender_balance() {
        let order = order(3300);
        let mut payments = vec![payment("a", 2000, PaymentStatus::Completed, 0)];

        assert_eq!(remaining_balance(&order, &payments).cents(), 1300);
        assert!(!is_fully_paid(&order, &payments));

        payments.push(payment("b", 1300, PaymentStatus::Completed, 1));
        assert_eq!(remaining_balance(&order, &payments).cents(), 0);
        assert!(is_fully_paid(&order, &payments));
    }

    #[test]
    fn test_payment_cap() {
        let order = order(3300);
        let payments = vec![payment("a", 2000, PaymentStatus::Completed, 0)];

        assert!(check_payment(&order, &payments, Money::from_cents(1300)).is_ok());
        let err = check_payment(&order, &payments, Money::from_cents(1301)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ExceedsOrderTotal { remaining, .. } if remaining.cents() == 1300
        ));
    }

    #[test]
    fn test_huge_payment_cannot_wrap_past_the_cap() {
        let order = order(3300);
        let payments = vec![payment("a", 1000, PaymentStatus::Completed, 0)];

        let err = check_payment(&order, &payments, Money::from_cents(i64::MAX)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(crate::ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_pending_payments_do_not_count_toward_cap() {
        let order = order(1000);
        let payments = vec![payment("a", 1000, PaymentStatus::Pending, 0)];
        assert!(check_payment(&order, &payments, Money::from_cents(1000)).is_ok());
    }

    #[test]
    fn test_closed_order_rejects_payment() {
        let mut order = order(1000);
        order.status = OrderStatus::Cancelled;
        let err = check_payment(&order, &[], Money::from_cents(100)).unwrap_err();
        assert!(matches!(err, CoreError::OrderClosed { .. }));
    }

    #[test]
    fn test_completion_requires_pending() {
        let order = order(1000);
        let done = payment("a", 500, PaymentStatus::Completed, 0);
        let err = check_completion(&order, &[done.clone()], &done).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentState { .. }));
    }

    #[test]
    fn test_refund_over_paid_fails() {
        let order = order(5000);
        let payments = vec![payment("a", 5000, PaymentStatus::Completed, 0)];

        let err = plan_refund(&order, &payments, Money::from_cents(6000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::ExceedsPaidAmount { refundable, .. } if refundable.cents() == 5000
        ));
    }

    #[test]
    fn test_refund_must_be_positive() {
        let order = order(5000);
        let err = plan_refund(&order, &[], Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRefundAmount { .. }));
    }

    #[test]
    fn test_refund_is_greedy_oldest_first() {
        let order = order(3300);
        let payments = vec![
            payment("a", 2000, PaymentStatus::Completed, 0),
            payment("b", 1300, PaymentStatus::Completed, 1),
        ];

        let plan = plan_refund(&order, &payments, Money::from_cents(2500)).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].source_payment_id, "a");
        assert_eq!(plan[0].amount.cents(), 2000);
        assert_eq!(plan[1].source_payment_id, "b");
        assert_eq!(plan[1].amount.cents(), 500);
    }

    #[test]
    fn test_refund_skips_already_refunded_portion() {
        let order = order(3300);
        let payments = vec![
            payment("a", 2000, PaymentStatus::Completed, 0),
            payment("b", 1300, PaymentStatus::Completed, 1),
            refund_of("a", 2000),
        ];

        let plan = plan_refund(&order, &payments, Money::from_cents(1300)).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source_payment_id, "b");
        assert!(plan_refund(&order, &payments, Money::from_cents(1301)).is_err());
    }
}

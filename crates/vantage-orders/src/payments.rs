//! # Payment Ledger
//!
//! Split-tender payments and refunds against an order.
//!
//! ## Payment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_payment ──► PENDING ──┬── complete_payment(settlement)          │
//! │                               │        │                                │
//! │                               │        ▼                                │
//! │                               │   COMPLETED ── completed ≥ total? ──►   │
//! │                               │                order → COMPLETED        │
//! │                               │                                         │
//! │                               └── fail_payment / order cancelled        │
//! │                                        ▼                                │
//! │                                      FAILED                             │
//! │                                                                         │
//! │  record_refund ──► one REFUNDED record per source payment (oldest       │
//! │                    first); refunded = completed? order → REFUNDED       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cap check and the write always happen in the same unit of work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use vantage_core::loyalty::points_for_amount;
use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::settlement::{
    check_completion, check_payment, is_fully_paid, plan_refund, remaining_balance, PaymentSummary,
};
use vantage_core::validation::{validate_amount_ceiling, validate_card_last4, validate_reason};
use vantage_core::{
    CoreError, CoreResult, Money, Order, OrderStatus, Payment, PaymentMethod, PaymentStatus,
    Principal, RefundDetail, ValidationError,
};

use crate::lifecycle::{load_order, OrderLifecycle};
use crate::loyalty::LoyaltyProgram;
use crate::short_code;

// =============================================================================
// Settlement
// =============================================================================

/// Confirmation that moves a PENDING payment to COMPLETED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Settlement {
    /// Cash handed over at the till. Change is computed.
    #[serde(rename_all = "camelCase")]
    Cash { tendered_cents: i64 },
    /// Card approved on the terminal.
    #[serde(rename_all = "camelCase")]
    Card { card_last4: String, card_brand: String },
    /// Confirmed by an external gateway.
    #[serde(rename_all = "camelCase")]
    Gateway { transaction_id: String },
    /// Paid from the customer's loyalty balance.
    LoyaltyPoints,
}

/// A settled payment and the order it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub order: Order,
    pub remaining_balance: Money,
}

/// Records written by one refund request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RefundOutcome {
    pub refund_id: String,
    pub records: Vec<Payment>,
    pub order: Order,
    /// Still refundable after this request.
    pub refundable: Money,
}

// =============================================================================
// Payment Ledger
// =============================================================================

pub struct PaymentLedger<S: Store> {
    store: Arc<S>,
    lifecycle: OrderLifecycle<S>,
    loyalty: LoyaltyProgram<S>,
}

impl<S: Store> Clone for PaymentLedger<S> {
    fn clone(&self) -> Self {
        PaymentLedger {
            store: self.store.clone(),
            lifecycle: self.lifecycle.clone(),
            loyalty: self.loyalty.clone(),
        }
    }
}

impl<S: Store> PaymentLedger<S> {
    pub fn new(store: Arc<S>, lifecycle: OrderLifecycle<S>, loyalty: LoyaltyProgram<S>) -> Self {
        PaymentLedger {
            store,
            lifecycle,
            loyalty,
        }
    }

    /// Records a PENDING payment.
    ///
    /// ## Errors
    /// - amount ≤ 0 → validation error
    /// - order not open → `OrderClosed`
    /// - completed + amount > total → `ExceedsOrderTotal` (nothing recorded)
    pub async fn record_payment(
        &self,
        order_id: &str,
        amount: Money,
        method: PaymentMethod,
        principal: &Principal,
    ) -> CoreResult<Payment> {
        let mut tx = self.store.begin().await?;
        let payment = self
            .record_in(&mut tx, order_id, amount, method, principal, Utc::now())
            .await?;
        tx.commit().await?;

        info!(
            order_id = %order_id,
            payment_id = %payment.id,
            amount = %amount,
            method = %method,
            "Payment recorded"
        );
        Ok(payment)
    }

    /// Marks a PENDING payment COMPLETED using the settlement details.
    ///
    /// Completes the order when completed payments reach its total.
    pub async fn complete_payment(
        &self,
        payment_id: &str,
        settlement: Settlement,
    ) -> CoreResult<PaymentOutcome> {
        let mut tx = self.store.begin().await?;
        let payment = tx
            .payment(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;
        let outcome = self
            .complete_in(&mut tx, payment, &settlement, Utc::now())
            .await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Records and settles a payment in one step (till tender).
    pub async fn collect_payment(
        &self,
        order_id: &str,
        amount: Money,
        method: PaymentMethod,
        settlement: Settlement,
        principal: &Principal,
    ) -> CoreResult<PaymentOutcome> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let payment = self
            .record_in(&mut tx, order_id, amount, method, principal, now)
            .await?;
        let outcome = self.complete_in(&mut tx, payment, &settlement, now).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Marks a PENDING payment FAILED.
    pub async fn fail_payment(&self, payment_id: &str) -> CoreResult<Payment> {
        let mut tx = self.store.begin().await?;
        let mut payment = tx
            .payment(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;

        if payment.status != PaymentStatus::Pending {
            return Err(CoreError::InvalidPaymentState {
                payment_id: payment.id,
                status: payment.status,
            });
        }

        payment.status = PaymentStatus::Failed;
        payment.updated_at = Utc::now();
        tx.update_payment(&payment).await?;
        tx.commit().await?;

        warn!(payment_id = %payment_id, order_id = %payment.order_id, "Payment marked failed");
        Ok(payment)
    }

    /// Refunds `amount` across completed payments, oldest first.
    ///
    /// ## Errors
    /// - amount ≤ 0 → `InvalidRefundAmount`
    /// - amount > completed − already refunded → `ExceedsPaidAmount`
    pub async fn record_refund(
        &self,
        order_id: &str,
        amount: Money,
        reason: &str,
        principal: &Principal,
    ) -> CoreResult<RefundOutcome> {
        validate_reason(reason)?;

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let mut order = load_order(&mut tx, order_id).await?;
        let mut payments = tx.payments_for_order(order_id).await?;

        let plan = plan_refund(&order, &payments, amount).map_err(|err| {
            warn!(order_id = %order_id, amount = %amount, error = %err, "Refund rejected");
            err
        })?;

        let refund_id = format!("REF-{}", short_code());
        let mut records = Vec::with_capacity(plan.len());
        for slice in plan {
            let record = Payment {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                amount_cents: -slice.amount.cents(),
                method: slice.method,
                status: PaymentStatus::Refunded,
                reference: Some(refund_id.clone()),
                card_last4: None,
                card_brand: None,
                tendered_cents: None,
                change_cents: None,
                refund: Some(RefundDetail {
                    refund_id: refund_id.clone(),
                    source_payment_id: slice.source_payment_id,
                    refunded_cents: slice.amount.cents(),
                    reason: reason.trim().to_string(),
                    refunded_at: now,
                }),
                recorded_by: Some(principal.id.clone()),
                created_at: now,
                updated_at: now,
            };
            tx.insert_payment(&record).await?;
            records.push(record);
        }

        payments.extend(records.iter().cloned());
        let summary = PaymentSummary::of(&payments);
        if summary.is_fully_refunded() {
            self.lifecycle
                .apply_in(&mut tx, &mut order, OrderStatus::Refunded, now)
                .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order_id,
            refund_id = %refund_id,
            amount = %amount,
            records = records.len(),
            principal_id = %principal.id,
            "Refund recorded"
        );

        Ok(RefundOutcome {
            refund_id,
            records,
            order,
            refundable: summary.refundable(),
        })
    }

    /// All payment records for an order, oldest first.
    pub async fn payments(&self, order_id: &str) -> CoreResult<Vec<Payment>> {
        let mut tx = self.store.begin().await?;
        load_order(&mut tx, order_id).await?;
        tx.payments_for_order(order_id).await
    }

    /// `max(0, total − completed)`.
    pub async fn remaining_balance(&self, order_id: &str) -> CoreResult<Money> {
        let mut tx = self.store.begin().await?;
        let order = load_order(&mut tx, order_id).await?;
        let payments = tx.payments_for_order(order_id).await?;
        Ok(remaining_balance(&order, &payments))
    }

    /// Completed payments cover the total.
    pub async fn is_fully_paid(&self, order_id: &str) -> CoreResult<bool> {
        let mut tx = self.store.begin().await?;
        let order = load_order(&mut tx, order_id).await?;
        let payments = tx.payments_for_order(order_id).await?;
        Ok(is_fully_paid(&order, &payments))
    }

    // -------------------------------------------------------------------------
    // Unit-of-work steps
    // -------------------------------------------------------------------------

    pub async fn record_in(
        &self,
        tx: &mut S::Tx,
        order_id: &str,
        amount: Money,
        method: PaymentMethod,
        principal: &Principal,
        at: DateTime<Utc>,
    ) -> CoreResult<Payment> {
        let order = load_order(tx, order_id).await?;
        let payments = tx.payments_for_order(order_id).await?;

        check_payment(&order, &payments, amount).map_err(|err| {
            warn!(order_id = %order_id, amount = %amount, error = %err, "Payment rejected");
            err
        })?;

        let payment = pending_payment(&order, amount, method, Some(&principal.id), at);
        tx.insert_payment(&payment).await?;
        Ok(payment)
    }

    pub async fn complete_in(
        &self,
        tx: &mut S::Tx,
        mut payment: Payment,
        settlement: &Settlement,
        at: DateTime<Utc>,
    ) -> CoreResult<PaymentOutcome> {
        let mut order = load_order(tx, &payment.order_id).await?;
        let mut payments = tx.payments_for_order(&order.id).await?;

        check_completion(&order, &payments, &payment).map_err(|err| {
            warn!(payment_id = %payment.id, error = %err, "Settlement rejected");
            err
        })?;

        self.settle(tx, &order, &mut payment, settlement).await?;
        payment.status = PaymentStatus::Completed;
        payment.updated_at = at;
        tx.update_payment(&payment).await?;

        if let Some(stored) = payments.iter_mut().find(|p| p.id == payment.id) {
            *stored = payment.clone();
        }

        info!(
            payment_id = %payment.id,
            order_id = %order.id,
            amount = %payment.amount(),
            method = %payment.method,
            "Payment completed"
        );

        if is_fully_paid(&order, &payments) {
            self.lifecycle
                .apply_in(tx, &mut order, OrderStatus::Completed, at)
                .await?;
        }

        Ok(PaymentOutcome {
            remaining_balance: remaining_balance(&order, &payments),
            payment,
            order,
        })
    }

    /// Validates settlement details against the payment and fills in the
    /// settlement fields.
    async fn settle(
        &self,
        tx: &mut S::Tx,
        order: &Order,
        payment: &mut Payment,
        settlement: &Settlement,
    ) -> CoreResult<()> {
        match settlement {
            Settlement::Cash { tendered_cents } => {
                require_method(payment, |m| m == PaymentMethod::Cash, "cash settlement")?;
                validate_amount_ceiling("tendered", *tendered_cents)?;
                let tendered = Money::from_cents(*tendered_cents);
                if tendered < payment.amount() {
                    return Err(CoreError::settlement(format!(
                        "tendered {} is less than amount due {}",
                        tendered,
                        payment.amount()
                    )));
                }
                payment.tendered_cents = Some(tendered.cents());
                payment.change_cents = Some((tendered - payment.amount()).cents());
                payment.reference = Some(format!("CASH-{}", short_code()));
            }
            Settlement::Card {
                card_last4,
                card_brand,
            } => {
                require_method(payment, |m| m.is_card(), "card settlement")?;
                validate_card_last4(card_last4)?;
                if card_brand.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "card_brand".to_string(),
                    }
                    .into());
                }
                payment.card_last4 = Some(card_last4.clone());
                payment.card_brand = Some(card_brand.trim().to_string());
                payment.reference = Some(format!("AUTH-{}", short_code()));
            }
            Settlement::Gateway { transaction_id } => {
                require_method(
                    payment,
                    |m| m.is_card() || m == PaymentMethod::MobilePayment,
                    "gateway settlement",
                )?;
                if transaction_id.trim().is_empty() {
                    return Err(ValidationError::Required {
                        field: "transaction_id".to_string(),
                    }
                    .into());
                }
                payment.reference = Some(transaction_id.trim().to_string());
            }
            Settlement::LoyaltyPoints => {
                require_method(
                    payment,
                    |m| m == PaymentMethod::LoyaltyPoints,
                    "loyalty settlement",
                )?;
                let points = points_for_amount(payment.amount());
                self.loyalty
                    .redeem_in(tx, &order.customer_id, points)
                    .await?;
                payment.reference = Some(format!("PTS-{}", points));
            }
        }
        Ok(())
    }
}

fn require_method(
    payment: &Payment,
    allowed: impl Fn(PaymentMethod) -> bool,
    what: &str,
) -> CoreResult<()> {
    if allowed(payment.method) {
        Ok(())
    } else {
        Err(CoreError::settlement(format!(
            "{} does not apply to a {} payment",
            what, payment.method
        )))
    }
}

/// A new PENDING payment for an order.
pub(crate) fn pending_payment(
    order: &Order,
    amount: Money,
    method: PaymentMethod,
    recorded_by: Option<&str>,
    at: DateTime<Utc>,
) -> Payment {
    Payment {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        amount_cents: amount.cents(),
        method,
        status: PaymentStatus::Pending,
        reference: None,
        card_last4: None,
        card_brand: None,
        tendered_cents: None,
        change_cents: None,
        refund: None,
        recorded_by: recorded_by.map(str::to_string),
        created_at: at,
        updated_at: at,
    }
}

//! # Order Service
//!
//! Entry point for the order workflow. Owns one instance of each component
//! and builds new orders.
//!
//! ## Order Creation
//! ```text
//! CreateOrderRequest
//!      │
//!      ▼
//! validate items, discount, shipping
//!      │
//!      ▼
//! ┌──────────────────────── one unit of work ────────────────────────────┐
//! │ load customer                                                        │
//! │ redeem loyalty points (LOYALTY_POINTS discount only)                 │
//! │ reserve stock for every line (compensating release on failure)       │
//! │ price lines from reserved snapshots, compute totals                  │
//! │ return points the clamped discount did not use                       │
//! │ insert order (PENDING) + optional PENDING payment for the total      │
//! └──────────────────────────────────────────────────────────────────────┘
//!      │
//!      ▼
//! OrderView { order, payments, remaining balance }
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use vantage_core::loyalty::points_for_amount;
use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::pricing::{compute_line_subtotal, compute_order_total, DiscountSpec, LineAmount};
use vantage_core::settlement::{is_fully_paid, remaining_balance};
use vantage_core::validation::{validate_id, validate_non_negative, validate_order_size};
use vantage_core::{
    CoreResult, DiscountKind, Money, Order, OrderLine, OrderStatus, Payment, PaymentMethod,
    Principal, TaxRate,
};

use crate::inventory::{InventoryLedger, StockRequest};
use crate::lifecycle::{load_order, OrderLifecycle};
use crate::loyalty::{load_customer, LoyaltyProgram};
use crate::payments::{pending_payment, PaymentLedger};

// =============================================================================
// Requests & Views
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

impl OrderItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderItemRequest {
            product_id: product_id.into(),
            quantity,
            discount_cents: 0,
        }
    }
}

/// Order-level discount. `value` is bps for PERCENTAGE, cents for FIXED and
/// points for LOYALTY_POINTS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountRequest {
    pub kind: DiscountKind,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub items: Vec<OrderItemRequest>,
    /// When set, a PENDING payment for the full total is recorded.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub discount: Option<DiscountRequest>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub shipping_cents: i64,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    pub fn new(customer_id: impl Into<String>, items: Vec<OrderItemRequest>) -> Self {
        CreateOrderRequest {
            customer_id: customer_id.into(),
            items,
            payment_method: None,
            discount: None,
            is_online: false,
            shipping_cents: 0,
            shipping_address: None,
            notes: None,
        }
    }

    pub fn with_discount(mut self, kind: DiscountKind, value: i64) -> Self {
        self.discount = Some(DiscountRequest { kind, value });
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn online(mut self, shipping: Money, address: impl Into<String>) -> Self {
        self.is_online = true;
        self.shipping_cents = shipping.cents();
        self.shipping_address = Some(address.into());
        self
    }
}

/// An order with its payment records and derived balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderView {
    pub order: Order,
    pub payments: Vec<Payment>,
    pub remaining_balance_cents: i64,
    pub is_fully_paid: bool,
}

impl OrderView {
    pub fn new(order: Order, payments: Vec<Payment>) -> Self {
        OrderView {
            remaining_balance_cents: remaining_balance(&order, &payments).cents(),
            is_fully_paid: is_fully_paid(&order, &payments),
            order,
            payments,
        }
    }
}

// =============================================================================
// Order Service
// =============================================================================

pub struct OrderService<S: Store> {
    store: Arc<S>,
    tax_rate: TaxRate,
    inventory: InventoryLedger<S>,
    loyalty: LoyaltyProgram<S>,
    lifecycle: OrderLifecycle<S>,
    payments: PaymentLedger<S>,
}

impl<S: Store> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        OrderService {
            store: self.store.clone(),
            tax_rate: self.tax_rate,
            inventory: self.inventory.clone(),
            loyalty: self.loyalty.clone(),
            lifecycle: self.lifecycle.clone(),
            payments: self.payments.clone(),
        }
    }
}

impl<S: Store> OrderService<S> {
    /// Wires every component over one store.
    pub fn new(store: Arc<S>, tax_rate: TaxRate) -> Self {
        let inventory = InventoryLedger::new(store.clone());
        let loyalty = LoyaltyProgram::new(store.clone());
        let lifecycle = OrderLifecycle::new(store.clone(), inventory.clone(), loyalty.clone());
        let payments = PaymentLedger::new(store.clone(), lifecycle.clone(), loyalty.clone());

        OrderService {
            store,
            tax_rate,
            inventory,
            loyalty,
            lifecycle,
            payments,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn inventory(&self) -> &InventoryLedger<S> {
        &self.inventory
    }

    pub fn loyalty(&self) -> &LoyaltyProgram<S> {
        &self.loyalty
    }

    pub fn lifecycle(&self) -> &OrderLifecycle<S> {
        &self.lifecycle
    }

    pub fn payments(&self) -> &PaymentLedger<S> {
        &self.payments
    }

    /// Creates a PENDING order, reserving stock for every line.
    ///
    /// Either every line is reserved and the order is stored, or nothing
    /// changes.
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        principal: &Principal,
    ) -> CoreResult<OrderView> {
        validate_id("customer_id", &request.customer_id)?;
        validate_order_size(request.items.len())?;
        validate_non_negative("shipping", request.shipping_cents)?;
        for item in &request.items {
            validate_non_negative("discount", item.discount_cents)?;
        }
        let discount_kind = request.discount.map(|d| d.kind);
        let mut discount_value = request.discount.map_or(0, |d| d.value);
        let discount = DiscountSpec::from_parts(discount_kind, discount_value)?;

        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        let mut tx = self.store.begin().await?;
        let customer = load_customer(&mut tx, &request.customer_id).await?;

        let mut points_redeemed = 0;
        if let DiscountSpec::LoyaltyPoints(_) = discount {
            if discount_value > 0 {
                self.loyalty
                    .redeem_in(&mut tx, &customer.id, discount_value)
                    .await?;
                points_redeemed = discount_value;
            }
        }

        let stock_requests: Vec<StockRequest> = request
            .items
            .iter()
            .map(|item| StockRequest::new(item.product_id.clone(), item.quantity))
            .collect();
        let reservations = self
            .inventory
            .reserve_all_in(&mut tx, &stock_requests)
            .await?;

        let mut lines = Vec::with_capacity(reservations.len());
        let mut amounts = Vec::with_capacity(reservations.len());
        for (position, (reservation, item)) in reservations.iter().zip(&request.items).enumerate() {
            let line_discount = Money::from_cents(item.discount_cents);
            let subtotal =
                compute_line_subtotal(reservation.unit_price, reservation.quantity, line_discount)?;
            amounts.push(LineAmount::new(
                reservation.unit_price,
                reservation.quantity,
                line_discount,
            ));
            lines.push(OrderLine {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: reservation.product_id.clone(),
                name_snapshot: reservation.name.clone(),
                unit_price_cents: reservation.unit_price.cents(),
                quantity: reservation.quantity,
                discount_cents: line_discount.cents(),
                subtotal_cents: subtotal.cents(),
                position: position as i64,
            });
        }

        let totals = compute_order_total(
            &amounts,
            discount,
            self.tax_rate,
            Money::from_cents(request.shipping_cents),
            request.is_online,
        )?;

        // A loyalty discount larger than the subtotal is clamped; hand back
        // the points that bought nothing.
        if points_redeemed > 0 {
            let used = points_for_amount(totals.discount).min(points_redeemed);
            let excess = points_redeemed - used;
            if excess > 0 {
                self.loyalty
                    .restore_in(&mut tx, &customer.id, excess)
                    .await?;
                debug!(customer_id = %customer.id, excess, "Unused redemption returned");
            }
            points_redeemed = used;
            discount_value = used;
        }

        let order = Order {
            id: order_id,
            customer_id: customer.id.clone(),
            cashier_id: Some(principal.id.clone()),
            status: OrderStatus::Pending,
            lines,
            subtotal_cents: totals.subtotal.cents(),
            discount_kind,
            discount_value,
            discount_cents: totals.discount.cents(),
            tax_rate_bps: self.tax_rate.bps(),
            tax_cents: totals.tax.cents(),
            shipping_cents: totals.shipping.cents(),
            total_cents: totals.total.cents(),
            is_online: request.is_online,
            shipping_address: request.shipping_address.filter(|_| request.is_online),
            loyalty_points_earned: 0,
            loyalty_points_redeemed: points_redeemed,
            notes: request.notes,
            version: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        tx.insert_order(&order).await?;

        let mut payments = Vec::new();
        if let Some(method) = request.payment_method {
            if totals.total.is_positive() {
                let payment = pending_payment(&order, totals.total, method, Some(&principal.id), now);
                tx.insert_payment(&payment).await?;
                payments.push(payment);
            }
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            lines = order.lines.len(),
            total = %totals.total,
            points_redeemed,
            principal_id = %principal.id,
            "Order created"
        );

        Ok(OrderView::new(order, payments))
    }

    /// Moves an order to a new status. See [`OrderLifecycle::transition_status`].
    pub async fn transition_status(
        &self,
        order_id: &str,
        status: &str,
        principal: &Principal,
    ) -> CoreResult<OrderView> {
        self.lifecycle
            .transition_status(order_id, status, principal)
            .await?;
        self.get_order(order_id).await
    }

    pub async fn get_order(&self, order_id: &str) -> CoreResult<OrderView> {
        let mut tx = self.store.begin().await?;
        let order = load_order(&mut tx, order_id).await?;
        let payments = tx.payments_for_order(order_id).await?;
        Ok(OrderView::new(order, payments))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Pricing & Totals
//!
//! Pure functions that turn order lines into an order total.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► Σ (unit × qty − line discount) = subtotal                    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  discount: PERCENTAGE (bps of subtotal, rounded)                        │
//! │            FIXED (cents)                                                │
//! │            LOYALTY_POINTS (cents, converted by caller)                  │
//! │            clamped to the subtotal                                      │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  tax = discounted × rate (rounded)                                      │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  + shipping, only for online orders with shipping > 0 (untaxed)         │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │               total                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding happens at exactly two points (discount amount and tax amount),
//! both half away from zero at cent precision.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::loyalty::points_value;
use crate::money::Money;
use crate::types::{DiscountKind, TaxRate};
use crate::validation::{
    amount_out_of_range, validate_amount_ceiling, validate_non_negative, validate_percentage_bps,
};

// =============================================================================
// Line Subtotal
// =============================================================================

/// Computes `unit_price × quantity − line_discount`.
///
/// ```rust
/// use vantage_core::money::Money;
/// use vantage_core::pricing::compute_line_subtotal;
///
/// let subtotal = compute_line_subtotal(Money::from_cents(1000), 3, Money::from_cents(150)).unwrap();
/// assert_eq!(subtotal.cents(), 2850);
/// ```
pub fn compute_line_subtotal(
    unit_price: Money,
    quantity: i64,
    line_discount: Money,
) -> CoreResult<Money> {
    if quantity < 1 {
        return Err(CoreError::InvalidQuantity { quantity });
    }
    validate_non_negative("line_discount", line_discount.cents())?;

    let gross = unit_price
        .checked_mul(quantity)
        .ok_or_else(|| amount_out_of_range("line_subtotal"))?;
    validate_amount_ceiling("line_subtotal", gross.cents())?;
    if line_discount > gross {
        return Err(ValidationError::OutOfRange {
            field: "line_discount".to_string(),
            min: 0,
            max: gross.cents(),
        }
        .into());
    }

    Ok(gross - line_discount)
}

/// The pricing inputs of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmount {
    pub unit_price: Money,
    pub quantity: i64,
    pub discount: Money,
}

impl LineAmount {
    pub fn new(unit_price: Money, quantity: i64, discount: Money) -> Self {
        LineAmount {
            unit_price,
            quantity,
            discount,
        }
    }

    pub fn subtotal(&self) -> CoreResult<Money> {
        compute_line_subtotal(self.unit_price, self.quantity, self.discount)
    }
}

// =============================================================================
// Order Discount
// =============================================================================

/// An order-level discount, already in the units the calculator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountSpec {
    None,
    /// Basis points of the subtotal (1000 = 10%).
    Percentage(u32),
    /// Fixed amount off.
    Fixed(Money),
    /// Currency value of redeemed points.
    LoyaltyPoints(Money),
}

impl DiscountSpec {
    /// Builds a discount from the stored `(kind, value)` pair.
    ///
    /// `value` is bps for percentage, cents for fixed and points for loyalty.
    pub fn from_parts(kind: Option<DiscountKind>, value: i64) -> CoreResult<Self> {
        match kind {
            None => Ok(DiscountSpec::None),
            Some(DiscountKind::Percentage) => {
                validate_percentage_bps(value)?;
                Ok(DiscountSpec::Percentage(value as u32))
            }
            Some(DiscountKind::Fixed) => {
                validate_non_negative("discount", value)?;
                Ok(DiscountSpec::Fixed(Money::from_cents(value)))
            }
            Some(DiscountKind::LoyaltyPoints) => {
                validate_non_negative("discount", value)?;
                Ok(DiscountSpec::LoyaltyPoints(points_value(value)))
            }
        }
    }

    pub fn kind(&self) -> Option<DiscountKind> {
        match self {
            DiscountSpec::None => None,
            DiscountSpec::Percentage(_) => Some(DiscountKind::Percentage),
            DiscountSpec::Fixed(_) => Some(DiscountKind::Fixed),
            DiscountSpec::LoyaltyPoints(_) => Some(DiscountKind::LoyaltyPoints),
        }
    }

    /// Discount amount for a subtotal, before clamping.
    fn amount_for(&self, subtotal: Money) -> CoreResult<Money> {
        match *self {
            DiscountSpec::None => Ok(Money::zero()),
            DiscountSpec::Percentage(bps) => {
                validate_percentage_bps(bps as i64)?;
                Ok(subtotal.apply_bps(bps))
            }
            DiscountSpec::Fixed(amount) | DiscountSpec::LoyaltyPoints(amount) => {
                validate_non_negative("discount", amount.cents())?;
                Ok(amount)
            }
        }
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// Result of [`compute_order_total`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    /// Discount actually applied (after clamping).
    pub discount: Money,
    pub tax: Money,
    /// Shipping actually charged (zero for in-store orders).
    pub shipping: Money,
    pub total: Money,
}

/// Computes the totals for an order.
///
/// ```rust
/// use vantage_core::money::Money;
/// use vantage_core::pricing::{compute_order_total, DiscountSpec, LineAmount};
/// use vantage_core::types::TaxRate;
///
/// let lines = [LineAmount::new(Money::from_cents(1000), 3, Money::zero())];
/// let totals = compute_order_total(
///     &lines,
///     DiscountSpec::Percentage(1000),
///     TaxRate::from_bps(1000),
///     Money::from_cents(500),
///     true,
/// )
/// .unwrap();
///
/// // 3000 − 300 = 2700, + 270 tax, + 500 shipping
/// assert_eq!(totals.total.cents(), 3470);
/// ```
pub fn compute_order_total(
    lines: &[LineAmount],
    discount: DiscountSpec,
    tax_rate: TaxRate,
    shipping: Money,
    is_online: bool,
) -> CoreResult<OrderTotals> {
    validate_non_negative("shipping", shipping.cents())?;

    let subtotal = lines.iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.subtotal()?)
            .ok_or_else(|| CoreError::from(amount_out_of_range("subtotal")))
    })?;
    validate_amount_ceiling("subtotal", subtotal.cents())?;

    let discount = discount.amount_for(subtotal)?.min(subtotal);
    let discounted = subtotal - discount;
    let tax = discounted.calculate_tax(tax_rate);
    let shipping = if is_online && shipping.is_positive() {
        shipping
    } else {
        Money::zero()
    };

    let total = discounted
        .checked_add(tax)
        .and_then(|t| t.checked_add(shipping))
        .ok_or_else(|| amount_out_of_range("total"))?;
    validate_amount_ceiling("total", total.cents())?;

    Ok(OrderTotals {
        subtotal,
        discount,
        tax,
        shipping,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_percent() -> TaxRate {
        TaxRate::from_bps(1000)
    }

    #[test]
    fn test_line_subtotal() {
        let subtotal = compute_line_subtotal(Money::from_cents(1000), 3, Money::zero()).unwrap();
        assert_eq!(subtotal.cents(), 3000);
    }

    #[test]
    fn test_line_subtotal_rejects_zero_quantity() {
        let err = compute_line_subtotal(Money::from_cents(1000), 0, Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { quantity: 0 }));
    }

    #[test]
    fn test_line_discount_cannot_exceed_gross() {
        let err =
            compute_line_subtotal(Money::from_cents(100), 2, Money::from_cents(201)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_three_items_ten_percent_tax() {
        let lines = [LineAmount::new(Money::from_cents(1000), 3, Money::zero())];
        let totals =
            compute_order_total(&lines, DiscountSpec::None, ten_percent(), Money::zero(), false)
                .unwrap();

        assert_eq!(totals.subtotal.cents(), 3000);
        assert_eq!(totals.tax.cents(), 300);
        assert_eq!(totals.total.cents(), 3300);
    }

    #[test]
    fn test_fixed_discount_is_clamped() {
        let lines = [LineAmount::new(Money::from_cents(500), 1, Money::zero())];
        let totals = compute_order_total(
            &lines,
            DiscountSpec::Fixed(Money::from_cents(900)),
            ten_percent(),
            Money::zero(),
            false,
        )
        .unwrap();

        assert_eq!(totals.discount.cents(), 500);
        assert_eq!(totals.total.cents(), 0);
    }

    #[test]
    fn test_percentage_discount_rounds_half_up() {
        // 1005 × 15% = 150.75 → 151 off
        let lines = [LineAmount::new(Money::from_cents(1005), 1, Money::zero())];
        let totals = compute_order_total(
            &lines,
            DiscountSpec::Percentage(1500),
            TaxRate::zero(),
            Money::zero(),
            false,
        )
        .unwrap();

        assert_eq!(totals.discount.cents(), 151);
        assert_eq!(totals.total.cents(), 854);
    }

    #[test]
    fn test_shipping_only_for_online_orders() {
        let lines = [LineAmount::new(Money::from_cents(2000), 1, Money::zero())];
        let shipping = Money::from_cents(499);

        let in_store =
            compute_order_total(&lines, DiscountSpec::None, ten_percent(), shipping, false)
                .unwrap();
        assert_eq!(in_store.shipping, Money::zero());
        assert_eq!(in_store.total.cents(), 2200);

        let online =
            compute_order_total(&lines, DiscountSpec::None, ten_percent(), shipping, true).unwrap();
        assert_eq!(online.shipping.cents(), 499);
        // Shipping is not taxed
        assert_eq!(online.total.cents(), 2699);
    }

    #[test]
    fn test_loyalty_points_discount_from_parts() {
        let spec = DiscountSpec::from_parts(Some(DiscountKind::LoyaltyPoints), 250).unwrap();
        assert_eq!(spec, DiscountSpec::LoyaltyPoints(Money::from_cents(250)));
        assert_eq!(spec.kind(), Some(DiscountKind::LoyaltyPoints));

        assert!(DiscountSpec::from_parts(Some(DiscountKind::Percentage), 12_000).is_err());
        assert_eq!(DiscountSpec::from_parts(None, 99).unwrap(), DiscountSpec::None);
    }

    #[test]
    fn test_same_inputs_same_totals() {
        let lines = [
            LineAmount::new(Money::from_cents(1999), 2, Money::from_cents(100)),
            LineAmount::new(Money::from_cents(349), 5, Money::zero()),
        ];
        let run = || {
            compute_order_total(
                &lines,
                DiscountSpec::Percentage(750),
                TaxRate::from_bps(825),
                Money::from_cents(300),
                true,
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_invalid_line_fails_whole_total() {
        let lines = [
            LineAmount::new(Money::from_cents(1000), 1, Money::zero()),
            LineAmount::new(Money::from_cents(1000), 0, Money::zero()),
        ];
        let err = compute_order_total(&lines, DiscountSpec::None, ten_percent(), Money::zero(), false)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_huge_shipping_is_rejected() {
        let lines = [LineAmount::new(Money::from_cents(1000), 3, Money::zero())];

        let err = compute_order_total(
            &lines,
            DiscountSpec::None,
            ten_percent(),
            Money::from_cents(i64::MAX),
            true,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_total_above_ceiling_is_rejected() {
        // Each input is within the ceiling, their sum is not.
        let lines = [LineAmount::new(Money::from_cents(crate::MAX_AMOUNT_CENTS), 1, Money::zero())];

        let err = compute_order_total(
            &lines,
            DiscountSpec::None,
            ten_percent(),
            Money::zero(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let overflow = compute_line_subtotal(Money::from_cents(i64::MAX / 2), 3, Money::zero());
        assert!(matches!(overflow, Err(CoreError::Validation(_))));
    }
}

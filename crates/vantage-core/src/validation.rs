//! # Validation Module
//!
//! Input validation for requests entering the order workflow.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: REST boundary (axum)                                         │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Shape checks: ids, limits, card digits, reasons                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Business rules (pricing, settlement, lifecycle)              │
//! │  └── Stock, payment caps, transitions                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite CHECK / FK constraints)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::BPS_SCALE;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_ID_LEN: usize = 64;
const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity identifier.
///
/// ```rust
/// use vantage_core::validation::validate_id;
///
/// assert!(validate_id("order_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("order_id", "  ").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a refund reason. Required so the audit trail is never blank.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    if reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(())
}

/// Validates the last four digits of a card number.
pub fn validate_card_last4(last4: &str) -> ValidationResult<()> {
    if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_last4".to_string(),
            reason: "must be exactly 4 digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// Below one is a business error (`InvalidQuantity`); above the per-line cap
/// is an input error.
///
/// ```text
/// qty < 1    → InvalidQuantity
/// qty > 999  → OutOfRange
/// ```
pub fn validate_line_quantity(qty: i64) -> CoreResult<()> {
    if qty < 1 {
        return Err(CoreError::InvalidQuantity { quantity: qty });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        }
        .into());
    }

    Ok(())
}

/// Validates a payment amount in cents.
///
/// ```text
/// cents ≤ 0                  → MustBePositive
/// cents > MAX_AMOUNT_CENTS   → OutOfRange
/// ```
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    validate_amount_ceiling("amount", cents)
}

/// Validates a non-negative amount such as shipping or a line discount.
pub fn validate_non_negative(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    validate_amount_ceiling(field, cents)
}

/// Rejects amounts above [`MAX_AMOUNT_CENTS`].
pub fn validate_amount_ceiling(field: &str, cents: i64) -> ValidationResult<()> {
    if cents > MAX_AMOUNT_CENTS {
        return Err(amount_out_of_range(field));
    }

    Ok(())
}

/// The error for an amount that is above the ceiling or overflowed a sum.
pub fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_AMOUNT_CENTS,
    }
}

/// Validates a percentage discount in basis points (0% to 100%).
pub fn validate_percentage_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=BPS_SCALE).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: BPS_SCALE,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps as i64 > BPS_SCALE {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: BPS_SCALE,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a new order.
pub fn validate_order_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_ORDER_LINES {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_ORDER_LINES,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

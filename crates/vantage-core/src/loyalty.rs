//! # Loyalty Rules
//!
//! Points accrual, redemption and tier assignment on a [`LoyaltyAccount`].
//!
//! ## Rules
//! ```text
//! accrue(spend)   +floor(spend in whole currency units) points
//!                 +spend to lifetime spend, +1 visit, tier recomputed
//!
//! redeem(points)  balance < points → InsufficientPoints (no change)
//!                 otherwise −points, returns points × 1¢
//!
//! tier            lifetime spend ≥ $10,000 → PLATINUM
//!                                ≥  $5,000 → GOLD
//!                                ≥  $1,000 → SILVER
//!                                otherwise → BRONZE
//! ```
//!
//! Tier is always derived from lifetime spend. Redemption never lowers
//! lifetime spend, so a redemption cannot drop a customer's tier.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{LoyaltyAccount, LoyaltyTier};

/// Currency value of one loyalty point, in cents.
pub const POINT_VALUE_CENTS: i64 = 1;

const PLATINUM_SPEND_CENTS: i64 = 1_000_000;
const GOLD_SPEND_CENTS: i64 = 500_000;
const SILVER_SPEND_CENTS: i64 = 100_000;

/// Currency value of a number of points.
#[inline]
pub fn points_value(points: i64) -> Money {
    Money::from_cents(points * POINT_VALUE_CENTS)
}

/// Points needed to cover an amount, rounding up to a whole point.
#[inline]
pub fn points_for_amount(amount: Money) -> i64 {
    (amount.cents() + POINT_VALUE_CENTS - 1) / POINT_VALUE_CENTS
}

/// One point per whole currency unit spent.
///
/// ```rust
/// use vantage_core::loyalty::points_earned;
/// use vantage_core::money::Money;
///
/// assert_eq!(points_earned(Money::from_cents(3399)), 33);
/// assert_eq!(points_earned(Money::from_cents(-500)), 0);
/// ```
#[inline]
pub fn points_earned(spend: Money) -> i64 {
    spend.cents().max(0) / 100
}

/// Tier for a lifetime spend.
pub fn tier_for_spend(lifetime_spend: Money) -> LoyaltyTier {
    match lifetime_spend.cents() {
        c if c >= PLATINUM_SPEND_CENTS => LoyaltyTier::Platinum,
        c if c >= GOLD_SPEND_CENTS => LoyaltyTier::Gold,
        c if c >= SILVER_SPEND_CENTS => LoyaltyTier::Silver,
        _ => LoyaltyTier::Bronze,
    }
}

/// Records a completed purchase. Returns the points earned.
pub fn accrue(account: &mut LoyaltyAccount, spend: Money, at: DateTime<Utc>) -> i64 {
    let spend = if spend.is_negative() { Money::zero() } else { spend };
    let earned = points_earned(spend);

    account.points_balance += earned;
    account.lifetime_spend_cents += spend.cents();
    account.visit_count += 1;
    account.last_visit_at = Some(at);
    account.tier = tier_for_spend(account.lifetime_spend());

    earned
}

/// Spends points. Returns their currency value.
pub fn redeem(account: &mut LoyaltyAccount, points: i64) -> CoreResult<Money> {
    if points <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "points".to_string(),
        }
        .into());
    }

    if account.points_balance < points {
        return Err(CoreError::InsufficientPoints {
            available: account.points_balance,
            requested: points,
        });
    }

    account.points_balance -= points;
    account.tier = tier_for_spend(account.lifetime_spend());

    Ok(points_value(points))
}

/// Gives back points from a redemption that was undone.
pub fn restore(account: &mut LoyaltyAccount, points: i64) {
    if points > 0 {
        account.points_balance += points;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for_spend(Money::from_cents(99_999)), LoyaltyTier::Bronze);
        assert_eq!(tier_for_spend(Money::from_cents(100_000)), LoyaltyTier::Silver);
        assert_eq!(tier_for_spend(Money::from_cents(500_000)), LoyaltyTier::Gold);
        assert_eq!(tier_for_spend(Money::from_cents(1_000_000)), LoyaltyTier::Platinum);
    }

    #[test]
    fn test_accrue_updates_history() {
        let mut account = LoyaltyAccount::default();
        let now = Utc::now();

        let earned = accrue(&mut account, Money::from_cents(120_050), now);

        assert_eq!(earned, 1200);
        assert_eq!(account.points_balance, 1200);
        assert_eq!(account.lifetime_spend_cents, 120_050);
        assert_eq!(account.visit_count, 1);
        assert_eq!(account.last_visit_at, Some(now));
        assert_eq!(account.tier, LoyaltyTier::Silver);
    }

    #[test]
    fn test_redeem_with_empty_balance_fails_unchanged() {
        let mut account = LoyaltyAccount::default();

        let err = redeem(&mut account, 100).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientPoints {
                available: 0,
                requested: 100
            }
        ));
        assert_eq!(account.points_balance, 0);
    }

    #[test]
    fn test_redeem_keeps_tier() {
        let mut account = LoyaltyAccount::default();
        accrue(&mut account, Money::from_cents(600_000), Utc::now());
        assert_eq!(account.tier, LoyaltyTier::Gold);

        let value = redeem(&mut account, 6000).unwrap();

        assert_eq!(value.cents(), 6000);
        assert_eq!(account.points_balance, 0);
        assert_eq!(account.tier, LoyaltyTier::Gold);
    }

    #[test]
    fn test_redeem_rejects_non_positive() {
        let mut account = LoyaltyAccount::default();
        assert!(matches!(redeem(&mut account, 0), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_restore_and_conversion() {
        let mut account = LoyaltyAccount::default();
        restore(&mut account, 40);
        restore(&mut account, -5);
        assert_eq!(account.points_balance, 40);
        assert_eq!(points_for_amount(Money::from_cents(1300)), 1300);
        assert_eq!(points_value(250).cents(), 250);
    }
}

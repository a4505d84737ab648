//! Loyalty program service: applies the `vantage_core::loyalty` rules to
//! stored customers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use vantage_core::loyalty;
use vantage_core::ports::{Store, UnitOfWork};
use vantage_core::{CoreError, CoreResult, Customer, Money};

pub struct LoyaltyProgram<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for LoyaltyProgram<S> {
    fn clone(&self) -> Self {
        LoyaltyProgram {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> LoyaltyProgram<S> {
    pub fn new(store: Arc<S>) -> Self {
        LoyaltyProgram { store }
    }

    pub async fn customer(&self, customer_id: &str) -> CoreResult<Customer> {
        let mut tx = self.store.begin().await?;
        load_customer(&mut tx, customer_id).await
    }

    /// Redeems points in its own unit of work. Returns their value.
    pub async fn redeem(&self, customer_id: &str, points: i64) -> CoreResult<Money> {
        let mut tx = self.store.begin().await?;
        let value = self.redeem_in(&mut tx, customer_id, points).await?;
        tx.commit().await?;
        Ok(value)
    }

    pub async fn redeem_in(&self, tx: &mut S::Tx, customer_id: &str, points: i64) -> CoreResult<Money> {
        let mut customer = load_customer(tx, customer_id).await?;

        let value = loyalty::redeem(&mut customer.loyalty, points).map_err(|err| {
            warn!(customer_id = %customer_id, points, error = %err, "Redemption rejected");
            err
        })?;
        customer.updated_at = Utc::now();
        tx.save_customer(&customer).await?;

        info!(
            customer_id = %customer_id,
            points,
            balance = customer.loyalty.points_balance,
            "Loyalty points redeemed"
        );
        Ok(value)
    }

    /// Adds points for a completed purchase. Returns the points earned.
    pub async fn accrue_in(
        &self,
        tx: &mut S::Tx,
        customer_id: &str,
        spend: Money,
        at: DateTime<Utc>,
    ) -> CoreResult<i64> {
        let mut customer = load_customer(tx, customer_id).await?;
        let previous_tier = customer.loyalty.tier;

        let earned = loyalty::accrue(&mut customer.loyalty, spend, at);
        customer.updated_at = at;
        tx.save_customer(&customer).await?;

        info!(
            customer_id = %customer_id,
            spend = %spend,
            earned,
            tier = ?customer.loyalty.tier,
            tier_changed = previous_tier != customer.loyalty.tier,
            "Loyalty accrued"
        );
        Ok(earned)
    }

    /// Returns points from a redemption that was undone.
    pub async fn restore_in(&self, tx: &mut S::Tx, customer_id: &str, points: i64) -> CoreResult<()> {
        if points <= 0 {
            return Ok(());
        }
        let mut customer = load_customer(tx, customer_id).await?;
        loyalty::restore(&mut customer.loyalty, points);
        customer.updated_at = Utc::now();
        tx.save_customer(&customer).await?;

        info!(customer_id = %customer_id, points, "Loyalty points restored");
        Ok(())
    }
}

pub(crate) async fn load_customer<T: UnitOfWork>(tx: &mut T, customer_id: &str) -> CoreResult<Customer> {
    tx.customer(customer_id)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| CoreError::not_found("Customer", customer_id))
}

//! Loyalty endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vantage_core::ports::Store;
use vantage_core::LoyaltyTier;

use crate::error::ApiResult;
use crate::extract::{ApiJson, Elevated};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub points: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResponse {
    pub customer_id: String,
    pub points_redeemed: i64,
    pub value_cents: i64,
    pub points_balance: i64,
    pub tier: LoyaltyTier,
}

/// `POST /api/customers/{id}/loyalty/redeem`
///
/// Manual redemption outside an order (goodwill, manager override).
pub async fn redeem_points<S: Store>(
    State(state): State<AppState<S>>,
    Elevated(principal): Elevated,
    Path(customer_id): Path<String>,
    ApiJson(body): ApiJson<RedeemRequest>,
) -> ApiResult<Json<RedeemResponse>> {
    let loyalty = state.service.loyalty();
    let value = loyalty.redeem(&customer_id, body.points).await?;
    let customer = loyalty.customer(&customer_id).await?;

    info!(
        customer_id = %customer_id,
        points = body.points,
        principal_id = %principal.id,
        "Manual loyalty redemption"
    );

    Ok(Json(RedeemResponse {
        customer_id,
        points_redeemed: body.points,
        value_cents: value.cents(),
        points_balance: customer.loyalty.points_balance,
        tier: customer.loyalty.tier,
    }))
}

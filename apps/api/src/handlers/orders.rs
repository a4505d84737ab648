//! Order endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vantage_core::ports::Store;
use vantage_core::settlement::PaymentSummary;
use vantage_orders::{CreateOrderRequest, OrderView};

use crate::error::ApiResult;
use crate::extract::{ApiJson, Staff};
use crate::AppState;

/// `POST /api/orders`
pub async fn create_order<S: Store>(
    State(state): State<AppState<S>>,
    Staff(principal): Staff,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    debug!(
        customer_id = %request.customer_id,
        lines = request.items.len(),
        "create_order"
    );
    let view = state.service.create_order(request, &principal).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /api/orders/{id}`
pub async fn get_order<S: Store>(
    State(state): State<AppState<S>>,
    Staff(_): Staff,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(state.service.get_order(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// `PATCH /api/orders/{id}/status`
pub async fn transition_status<S: Store>(
    State(state): State<AppState<S>>,
    Staff(principal): Staff,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> ApiResult<Json<OrderView>> {
    let view = state
        .service
        .transition_status(&id, &body.status, &principal)
        .await?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub order_id: String,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub refunded_cents: i64,
    pub remaining_balance_cents: i64,
    pub is_fully_paid: bool,
}

/// `GET /api/orders/{id}/balance`
pub async fn balance<S: Store>(
    State(state): State<AppState<S>>,
    Staff(_): Staff,
    Path(id): Path<String>,
) -> ApiResult<Json<BalanceResponse>> {
    let view = state.service.get_order(&id).await?;
    let summary = PaymentSummary::of(&view.payments);
    Ok(Json(BalanceResponse {
        paid_cents: summary.completed.cents(),
        refunded_cents: summary.refunded.cents(),
        order_id: view.order.id,
        total_cents: view.order.total_cents,
        remaining_balance_cents: view.remaining_balance_cents,
        is_fully_paid: view.is_fully_paid,
    }))
}

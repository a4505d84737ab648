//! Payment and refund endpoints.
//!
//! `POST /api/orders/{id}/payments` with a `settlement` records and settles
//! the payment in one unit of work (till tender). Without one it only records
//! a PENDING payment, to be settled later through
//! `POST /api/payments/{id}/complete`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use vantage_core::ports::Store;
use vantage_core::{Money, Order, Payment, PaymentMethod};
use vantage_orders::{PaymentOutcome, RefundOutcome, Settlement};

use crate::error::ApiResult;
use crate::extract::{ApiJson, Elevated, Staff};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment: Payment,
    /// Present when the payment was settled and the order may have moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    pub remaining_balance_cents: i64,
}

impl From<PaymentOutcome> for PaymentResponse {
    fn from(outcome: PaymentOutcome) -> Self {
        PaymentResponse {
            payment: outcome.payment,
            order: Some(outcome.order),
            remaining_balance_cents: outcome.remaining_balance.cents(),
        }
    }
}

/// `POST /api/orders/{id}/payments`
pub async fn record_payment<S: Store>(
    State(state): State<AppState<S>>,
    Staff(principal): Staff,
    Path(order_id): Path<String>,
    ApiJson(body): ApiJson<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let ledger = state.service.payments();
    let amount = Money::from_cents(body.amount_cents);

    let response = match body.settlement {
        Some(settlement) => ledger
            .collect_payment(&order_id, amount, body.payment_method, settlement, &principal)
            .await?
            .into(),
        None => {
            let payment = ledger
                .record_payment(&order_id, amount, body.payment_method, &principal)
                .await?;
            let remaining = ledger.remaining_balance(&order_id).await?;
            PaymentResponse {
                payment,
                order: None,
                remaining_balance_cents: remaining.cents(),
            }
        }
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub settlement: Settlement,
}

/// `POST /api/payments/{id}/complete`
pub async fn complete_payment<S: Store>(
    State(state): State<AppState<S>>,
    Staff(_): Staff,
    Path(payment_id): Path<String>,
    ApiJson(body): ApiJson<CompleteRequest>,
) -> ApiResult<Json<PaymentResponse>> {
    let outcome = state
        .service
        .payments()
        .complete_payment(&payment_id, body.settlement)
        .await?;
    Ok(Json(outcome.into()))
}

/// `POST /api/payments/{id}/fail`
pub async fn fail_payment<S: Store>(
    State(state): State<AppState<S>>,
    Elevated(_): Elevated,
    Path(payment_id): Path<String>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(state.service.payments().fail_payment(&payment_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub amount_cents: i64,
    pub reason: String,
}

/// `POST /api/orders/{id}/refund`
pub async fn record_refund<S: Store>(
    State(state): State<AppState<S>>,
    Elevated(principal): Elevated,
    Path(order_id): Path<String>,
    ApiJson(body): ApiJson<RefundRequest>,
) -> ApiResult<(StatusCode, Json<RefundOutcome>)> {
    let outcome = state
        .service
        .payments()
        .record_refund(
            &order_id,
            Money::from_cents(body.amount_cents),
            &body.reason,
            &principal,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

//! HTTP handlers, one module per resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use vantage_core::ports::Store;

use crate::AppState;

pub mod customers;
pub mod orders;
pub mod payments;
pub mod products;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// Liveness plus a storage round trip. 503 when the store is unreachable.
pub async fn health<S: Store>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = state.service.store().health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database,
        }),
    )
}

//! Product endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vantage_core::ports::Store;
use vantage_core::Product;
use vantage_orders::StockAdjustment;

use crate::error::ApiResult;
use crate::extract::{ApiJson, Elevated, Staff};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub quantity: i64,
    #[serde(rename = "type")]
    pub kind: StockAdjustment,
}

/// `GET /api/products/low-stock`
///
/// Active products at or below their threshold, lowest stock first.
pub async fn low_stock<S: Store>(
    State(state): State<AppState<S>>,
    Staff(_): Staff,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.service.inventory().low_stock().await?))
}

/// `PATCH /api/products/{id}/stock`
///
/// Manual restock or write-off. Manager or admin only.
pub async fn adjust_stock<S: Store>(
    State(state): State<AppState<S>>,
    Elevated(principal): Elevated,
    Path(product_id): Path<String>,
    ApiJson(body): ApiJson<StockRequest>,
) -> ApiResult<Json<Product>> {
    let product = state
        .service
        .inventory()
        .adjust_stock(&product_id, body.quantity, body.kind)
        .await?;
    info!(
        product_id = %product_id,
        principal_id = %principal.id,
        stock = product.stock_quantity,
        "Stock adjusted via API"
    );
    Ok(Json(product))
}

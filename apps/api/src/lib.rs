//! # vantage-api: REST Boundary
//!
//! axum router over [`OrderService`]. Handlers translate HTTP into service
//! calls; business rules stay in `vantage-orders` and `vantage-core`.
//!
//! ## Request Flow
//! ```text
//! HTTP request
//!      │
//!      ▼
//! TraceLayer ──► Staff / Elevated extractor (X-Principal-* headers)
//!      │
//!      ▼
//! handler ──► OrderService<S> ──► Store (SQLite or in-memory)
//!      │
//!      ▼
//! Json<T>  or  ApiError { code, message }
//! ```

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use vantage_core::ports::Store;
use vantage_orders::OrderService;

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared handler state.
pub struct AppState<S: Store> {
    pub service: Arc<OrderService<S>>,
}

impl<S: Store> AppState<S> {
    pub fn new(service: OrderService<S>) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            service: self.service.clone(),
        }
    }
}

/// Builds the application router.
pub fn router<S: Store>(state: AppState<S>) -> Router {
    use handlers::{customers, orders, payments, products};

    let api = Router::new()
        .route("/orders", post(orders::create_order::<S>))
        .route("/orders/{id}", get(orders::get_order::<S>))
        .route("/orders/{id}/status", patch(orders::transition_status::<S>))
        .route("/orders/{id}/balance", get(orders::balance::<S>))
        .route("/orders/{id}/payments", post(payments::record_payment::<S>))
        .route("/orders/{id}/refund", post(payments::record_refund::<S>))
        .route("/payments/{id}/complete", post(payments::complete_payment::<S>))
        .route("/payments/{id}/fail", post(payments::fail_payment::<S>))
        .route(
            "/customers/{id}/loyalty/redeem",
            post(customers::redeem_points::<S>),
        )
        .route("/products/low-stock", get(products::low_stock::<S>))
        .route("/products/{id}/stock", patch(products::adjust_stock::<S>));

    Router::new()
        .route("/health", get(handlers::health::<S>))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! # vantage-core: Pure Business Logic for Vantage POS
//!
//! Everything that decides *what* happens to an order lives here as pure
//! functions. Storage and transport are reached only through the traits in
//! [`ports`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Vantage POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               apps/api (axum REST boundary)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           vantage-orders (services over the ports)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ vantage-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  money · pricing · loyalty · settlement · lifecycle · ports     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ implemented by                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                vantage-db (SQLite repositories)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Payment, Customer, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Line subtotals and order totals
//! - [`loyalty`] - Points accrual, redemption and tiers
//! - [`settlement`] - Payment cap and refund allocation math
//! - [`lifecycle`] - Order status transition table
//! - [`ports`] - Persistence traits implemented by storage crates
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vantage_core::money::Money;
//! use vantage_core::pricing::{compute_order_total, DiscountSpec, LineAmount};
//! use vantage_core::types::TaxRate;
//!
//! let lines = [LineAmount::new(Money::from_cents(1000), 3, Money::zero())];
//! let totals = compute_order_total(
//!     &lines,
//!     DiscountSpec::None,
//!     TaxRate::from_bps(1000),
//!     Money::zero(),
//!     false,
//! )
//! .unwrap();
//!
//! assert_eq!(totals.subtotal.cents(), 3000);
//! assert_eq!(totals.total.cents(), 3300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod loyalty;
pub mod money;
pub mod ports;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default sales tax applied to the discounted subtotal (10%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Maximum lines allowed on a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single amount accepted anywhere (payment, shipping, discount,
/// line, order total): $100,000,000.00.
///
/// Keeps every sum the workflow forms far from `i64` overflow.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;

/// Largest quantity a single manual stock adjustment may move.
pub const MAX_STOCK_ADJUSTMENT: i64 = 1_000_000;

/// Default stock level at or below which a product counts as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

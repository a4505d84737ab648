//! # vantage-orders: Order Workflow for Vantage POS
//!
//! Services that carry an order from creation to settlement, each built
//! over a [`Store`](vantage_core::ports::Store) injected at construction.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          OrderService                                   │
//! │   create_order · transition_status · get_order                          │
//! │        │                 │                                              │
//! │        ▼                 ▼                                              │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐                 │
//! │  │ Inventory   │◄──│ OrderLifecycle│◄──│ PaymentLedger│                 │
//! │  │ Ledger      │   │ (effects)     │   │ (settlement) │                 │
//! │  └─────────────┘   └──────┬────────┘   └──────┬───────┘                 │
//! │                           │                   │                         │
//! │                           ▼                   ▼                         │
//! │                    ┌──────────────────────────────┐                     │
//! │                    │        LoyaltyProgram        │                     │
//! │                    └──────────────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every public operation opens exactly one unit of work. The `*_in`
//! variants take a caller's unit of work so several steps commit together.
//!
//! ## Example
//! ```rust
//! # async fn demo() -> vantage_core::CoreResult<()> {
//! use std::sync::Arc;
//! use vantage_core::{Money, Principal, Product, Customer, Role, TaxRate};
//! use vantage_orders::memory::MemoryStore;
//! use vantage_orders::service::{CreateOrderRequest, OrderItemRequest, OrderService};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.seed_product(Product::new("p-1", "Mug", Money::from_cents(1000), 5)).await;
//! store.seed_customer(Customer::new("c-1", "Ada", "Lovelace", "ada@example.com")).await;
//!
//! let service = OrderService::new(store, TaxRate::from_bps(1000));
//! let cashier = Principal::new("u-1", Role::Employee);
//! let view = service
//!     .create_order(CreateOrderRequest::new("c-1", vec![OrderItemRequest::new("p-1", 3)]), &cashier)
//!     .await?;
//! assert_eq!(view.order.total_cents, 3300);
//! # Ok(())
//! # }
//! ```

pub mod inventory;
pub mod lifecycle;
pub mod loyalty;
pub mod memory;
pub mod payments;
pub mod service;

pub use inventory::{InventoryLedger, Reservation, StockAdjustment};
pub use lifecycle::OrderLifecycle;
pub use loyalty::LoyaltyProgram;
pub use memory::MemoryStore;
pub use payments::{PaymentLedger, PaymentOutcome, RefundOutcome, Settlement};
pub use service::{CreateOrderRequest, OrderItemRequest, OrderService, OrderView};

/// Short random suffix for human-facing references ("REF-1A2B3C4D").
pub(crate) fn short_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase()
}

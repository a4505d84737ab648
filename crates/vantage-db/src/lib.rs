//! # vantage-db: SQLite Store for Vantage POS
//!
//! Implements the [`Store`](vantage_core::ports::Store) port over SQLite.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vantage POS Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderService<Database> (vantage-orders)                               │
//! │       │  store.begin()                                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vantage-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │ UnitOfWork    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │───►│  (uow.rs)     │    │  (embedded)  │  │   │
//! │  │   │               │    │       │       │    │              │  │   │
//! │  │   │ SqlitePool    │    │       ▼       │    │ 001_init.sql │  │   │
//! │  │   │               │    │ repository/*  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vantage_db::{Database, DbConfig};
//! use vantage_orders::OrderService;
//!
//! let db = Database::new(DbConfig::new("./vantage.db")).await?;
//! let service = OrderService::new(Arc::new(db), TaxRate::default());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod uow;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use uow::SqliteUnitOfWork;

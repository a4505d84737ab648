//! # Repository Module
//!
//! SQL for each table, as functions over a borrowed connection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqliteUnitOfWork (uow.rs)                                              │
//! │       │                                                                 │
//! │       │  product::decrement_if_available(&mut *tx, id, qty)             │
//! │       ▼                                                                 │
//! │  product / order / payment / customer                                  │
//! │  ├── get_by_id(conn, id)                                               │
//! │  ├── insert(conn, entity)                                              │
//! │  └── update...(conn, entity)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite transaction                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions take `&mut SqliteConnection` so the same SQL runs inside a
//! transaction or on a bare pooled connection.

pub mod customer;
pub mod order;
pub mod payment;
pub mod product;

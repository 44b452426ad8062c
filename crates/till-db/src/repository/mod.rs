//! # Repository Module
//!
//! Database repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Store Traits                        │
//! │                                                                         │
//! │  SaleCommitter (till-session)                                          │
//! │       │                                                                 │
//! │       │  inventory.decrement_stock(id, qty)                            │
//! │       ▼                                                                 │
//! │  impl InventoryStore for ProductRepository                             │
//! │  ├── list_active / get_by_id / get_by_sku                              │
//! │  ├── insert / update / soft_delete                                     │
//! │  └── take_stock / return_stock   (conditional UPDATE ... RETURNING)   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SQL lives only in this module. Everything above it is written         │
//! │  against the traits and runs unchanged on the in-memory fakes.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD and stock (InventoryStore)
//! - [`sale::SaleRepository`] - Sales, items and payments (SaleStore)
//! - [`state::StateRepository`] - Key-value JSON documents (StateStore)
//! - [`customer::CustomerRepository`] - Customers over the `customers` document
//!
//! Queries are runtime-checked (`sqlx::query` / `query_as` with `FromRow`),
//! so building the workspace needs no `DATABASE_URL`.

pub mod customer;
pub mod product;
pub mod sale;
pub mod state;

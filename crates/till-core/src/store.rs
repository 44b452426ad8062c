//! # Store Traits
//!
//! The collaborators the checkout saga and the cash register talk to.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   till-session (SaleCommitter, CashierSession)                         │
//! │        │                │                 │                            │
//! │        ▼                ▼                 ▼                            │
//! │   InventoryStore    SaleStore        StateStore      ◄── THIS FILE     │
//! │        │                │                 │                            │
//! │        ├── till-db: ProductRepository / SaleRepository / StateRepository│
//! │        └── till-session::memory: in-memory fakes for tests             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations must make `decrement_stock` atomic: the check and the
//! write happen as one step, so two checkouts racing for the last unit can
//! never both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{Product, Sale};

// =============================================================================
// Store Error
// =============================================================================

/// What a store implementation reports back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Compare-and-decrement rejected: stock changed since it was read.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Conditional status transition rejected.
    #[error("Sale {sale_id} is {current_status}")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// The backing store failed (I/O, constraint, pool).
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Traits
// =============================================================================

/// Product records and their stock levels.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// All active products.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// One product by id, or `None`.
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;

    /// Atomically takes `quantity` units if at least that many are on hand.
    ///
    /// Returns the remaining stock. Fails with `InsufficientStock` (nothing
    /// changed) when the stock is lower than `quantity`.
    async fn decrement_stock(&self, id: &str, quantity: i64) -> StoreResult<i64>;

    /// Returns `quantity` units to stock. Returns the new stock level.
    async fn restock(&self, id: &str, quantity: i64) -> StoreResult<i64>;
}

/// Durable sale history: header, items and payment.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Persists a sale with its items and payment as one unit.
    async fn record_sale(&self, sale: &Sale) -> StoreResult<()>;

    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>>;

    /// Sales whose `created_at` lies in `[from, to)`, oldest first.
    async fn list_sales(&self, from: DateTime<Utc>, to: DateTime<Utc>)
        -> StoreResult<Vec<Sale>>;

    /// Moves a completed sale to cancelled. Fails with `InvalidSaleStatus`
    /// if the sale is not completed; returns the updated sale.
    async fn mark_cancelled(&self, id: &str, at: DateTime<Utc>) -> StoreResult<Sale>;
}

/// Key-value documents (`cashRegister`, `customers`).
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, key: &str) -> StoreResult<Option<serde_json::Value>>;

    async fn save(&self, key: &str, value: &serde_json::Value) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let store_err: StoreError = err.into();
        assert!(matches!(store_err, StoreError::Serialization(_)));
    }
}

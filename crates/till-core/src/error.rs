//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations (cart, ledger, sale)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-core store errors (store.rs)                                     │
//! │  └── StoreError       - What inventory/persistence adapters report     │
//! │                                                                         │
//! │  till-db errors                                                        │
//! │  └── DbError          - Database operation failures → StoreError       │
//! │                                                                         │
//! │  till-session errors                                                   │
//! │  └── SessionError     - What the caller sees (CommitFailed, ...)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All `CoreError` variants are local validation failures: they are reported
//! synchronously and never retried.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product has no stock and cannot be added to the cart.
    #[error("Product {product_id} is out of stock")]
    OutOfStock { product_id: String },

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Re-read stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, requested: 5, available: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Cart already holds the maximum number of distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout was attempted with no lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Discount outside 0%..=100% or one that would make the total negative.
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    /// Register operation that requires an open register.
    #[error("Cash register is closed")]
    RegisterClosed,

    /// `open` while the register is already open.
    #[error("Cash register is already open")]
    AlreadyOpen,

    /// Zero or negative amount where a positive one is required.
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Money, reason: String },

    /// Withdrawal larger than the cash in the drawer.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Cancelling a sale that is already cancelled
    /// - Cancelling a pending sale
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// A movement sequence that no sequence of register operations can produce.
    #[error("Invalid ledger at movement {position}: {reason}")]
    InvalidLedger { position: usize, reason: String },

    /// Stored register state disagrees with the fold of its movements.
    #[error("Ledger mismatch: stored balance {stored}, replayed balance {replayed}")]
    LedgerMismatch { stored: Money, replayed: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidAmount error.
    pub fn invalid_amount(amount: Money, reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            amount,
            reason: reason.into(),
        }
    }

    /// Creates an InvalidDiscount error.
    pub fn invalid_discount(reason: impl Into<String>) -> Self {
        CoreError::InvalidDiscount {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p-1: available 3, requested 5"
        );

        let err = CoreError::InsufficientFunds {
            requested: Money::from_cents(15000),
            available: Money::from_cents(12000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 150.00, available 120.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

//! # Session Error Type
//!
//! Unified error type for session and checkout operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Till POS                               │
//! │                                                                         │
//! │  CoreError (rules)  ─────────────────────────┐                          │
//! │    EmptyCart, InvalidDiscount, RegisterClosed │                          │
//! │                                               ▼                          │
//! │  StoreError (adapters) ──► domain variants ──► SessionError ──► code()  │
//! │    ProductNotFound, InsufficientStock ...     ▲                          │
//! │    Backend, Serialization ────────────────────┤                          │
//! │                                               │                          │
//! │  Commit protocol ─────────────────────────────┘                          │
//! │    CommitFailed, CompensationFailed, RestockFailed                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store failures that mean something to the cashier (missing product,
//! short stock, wrong sale status) surface as the matching [`CoreError`],
//! so callers match on one set of variants whichever store is plugged in.

use serde::Serialize;
use thiserror::Error;
use till_core::{CoreError, StoreError};

/// Errors from session and checkout operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A business rule rejected the operation. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A store failed outside the commit protocol.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// A commit step failed; every stock decrement was restored.
    #[error("Sale could not be committed: {cause}")]
    CommitFailed { cause: String },

    /// A commit step failed and some decrements could not be restored.
    ///
    /// `unrestored` lists the product ids whose stock is now too low.
    #[error("Sale could not be committed ({cause}); stock not restored for {unrestored:?}")]
    CompensationFailed {
        cause: String,
        unrestored: Vec<String>,
    },

    /// The sale is cancelled but some items were not returned to stock.
    #[error("Sale {sale_id} cancelled; stock not restored for {unrestored:?}")]
    RestockFailed {
        sale_id: String,
        unrestored: Vec<String>,
    },
}

/// Store failures with a domain meaning become the matching `CoreError`.
impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => CoreError::ProductNotFound(id).into(),
            StoreError::SaleNotFound(id) => CoreError::SaleNotFound(id).into(),
            StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => CoreError::InsufficientStock {
                product_id,
                requested,
                available,
            }
            .into(),
            StoreError::InvalidSaleStatus {
                sale_id,
                current_status,
            } => CoreError::InvalidSaleStatus {
                sale_id,
                current_status,
            }
            .into(),
            other => SessionError::Store(other),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Error codes for machine consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or sale does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Cart operation failed (empty cart, out of stock)
    CartError,

    /// Not enough stock to sell
    InsufficientStock,

    /// Cash register operation rejected
    RegisterError,

    /// Business rule violated (sale status, discount)
    BusinessLogic,

    /// Persisted state is corrupt
    DataIntegrity,

    /// Store backend failed
    DatabaseError,

    /// Commit failed and was rolled back
    CommitFailed,

    /// Commit or cancellation left stock out of sync
    CompensationFailed,
}

impl SessionError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::Core(err) => match err {
                CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
                CoreError::OutOfStock { .. }
                | CoreError::CartTooLarge { .. }
                | CoreError::EmptyCart => ErrorCode::CartError,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::RegisterClosed
                | CoreError::AlreadyOpen
                | CoreError::InvalidAmount { .. }
                | CoreError::InsufficientFunds { .. } => ErrorCode::RegisterError,
                CoreError::InvalidDiscount { .. } | CoreError::InvalidSaleStatus { .. } => {
                    ErrorCode::BusinessLogic
                }
                CoreError::InvalidLedger { .. } | CoreError::LedgerMismatch { .. } => {
                    ErrorCode::DataIntegrity
                }
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            SessionError::Store(StoreError::Serialization(_)) => ErrorCode::DataIntegrity,
            SessionError::Store(_) => ErrorCode::DatabaseError,
            SessionError::CommitFailed { .. } => ErrorCode::CommitFailed,
            SessionError::CompensationFailed { .. } | SessionError::RestockFailed { .. } => {
                ErrorCode::CompensationFailed
            }
        }
    }
}

/// Serializable error body.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for p-1: ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&SessionError> for ErrorResponse {
    fn from(err: &SessionError) -> Self {
        ErrorResponse {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::Money;

    #[test]
    fn test_store_errors_become_domain_errors() {
        let err: SessionError = StoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 1,
            requested: 3,
        }
        .into();

        assert!(matches!(
            err,
            SessionError::Core(CoreError::InsufficientStock {
                requested: 3,
                available: 1,
                ..
            })
        ));
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err: SessionError = StoreError::Backend("disk I/O error".to_string()).into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_error_response_serialization() {
        let err = SessionError::Core(CoreError::InsufficientFunds {
            requested: Money::from_cents(5000),
            available: Money::from_cents(1000),
        });

        let json = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(json["code"], "REGISTER_ERROR");
        assert!(json["message"].as_str().unwrap().contains("50.00"));
    }
}

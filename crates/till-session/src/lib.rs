//! # till-session: Cashier Session and Checkout
//!
//! Orchestration layer for Till POS: everything that takes more than one
//! step or touches more than one store.
//!
//! ## Module Organization
//! ```text
//! till_session/
//! ├── lib.rs          ◄─── You are here (exports, logging setup)
//! ├── session.rs      ◄─── CashierSession: cart + cash ledger + cashier
//! ├── checkout.rs     ◄─── SaleCommitter: commit protocol and cancellation
//! ├── report.rs       ◄─── Sales report over a SaleStore
//! ├── config.rs       ◄─── SessionConfig (defaults + TILL_* env vars)
//! ├── memory.rs       ◄─── In-memory stores with failure injection
//! ├── error.rs        ◄─── SessionError and ErrorCode
//! └── bin/
//!     └── till-report.rs
//! ```
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Commit                                      │
//! │                                                                         │
//! │  CashierSession.cart ──► build_sale (totals, discount, snapshots)      │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  InventoryStore ──► read every product, check stock (no writes yet)    │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  InventoryStore ──► decrement line by line ──┐                         │
//! │                              │               │ failure                  │
//! │                              ▼               ▼                          │
//! │  SaleStore ──► record sale + items + payment ──► restock applied lines  │
//! │                              │                    (reverse order)       │
//! │                              ▼                                          │
//! │  CashLedger ──► sale movement (cash, open) / pending (cash, closed)     │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  cart cleared                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod memory;
pub mod report;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CommitReceipt, SaleCommitter};
pub use config::SessionConfig;
pub use error::{ErrorCode, ErrorResponse, SessionError, SessionResult};
pub use report::sales_report;
pub use session::CashierSession;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,till=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till_session=trace` - Trace the commit protocol only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Calling it twice is harmless; the second call does nothing.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

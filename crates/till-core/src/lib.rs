//! # till-core: Pure Business Logic for Till POS
//!
//! This crate is the **heart** of Till POS. It contains the cart, the cash
//! ledger and the pure half of the sale commit protocol, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    till-session                                 │   │
//! │  │    CashierSession ──► SaleCommitter ──► register operations     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ ledger  │ │  sale   │  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │  Cash   │ │  Sale   │  │   │
//! │  │   │  Sale   │ │Discount │ │CartLine │ │ Ledger  │ │ Totals  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   store (traits) • report (projection) • validation • error    │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │         SQLite repositories implementing the store traits       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Payment, Customer, etc.)
//! - [`money`] - Money and DiscountRate with integer arithmetic
//! - [`cart`] - The shopping cart
//! - [`ledger`] - The cash register ledger and its projector
//! - [`sale`] - Totals and immutable Sale construction
//! - [`report`] - Sales report projection
//! - [`store`] - Traits for the inventory and persistence collaborators
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::{DiscountRate, Money};
//!
//! let subtotal = Money::from_cents(2500); // R$ 25.00
//! let discount = subtotal.percentage(DiscountRate::from_bps(1000).unwrap()); // 10%
//! assert_eq!((subtotal - discount).cents(), 2250);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod report;
pub mod sale;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{
    CashLedger, CashMovement, CashRegisterSnapshot, CashRegisterState, CashSaleOutcome,
    MovementKind, PendingCashSale,
};
pub use money::{DiscountRate, Money};
pub use report::{build_report, ReportPeriod, SalesReport};
pub use sale::{build_sale, CheckoutRequest, SaleTotals};
pub use store::{InventoryStore, SaleStore, StateStore, StoreError, StoreResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Key of the persisted cash register document in the key-value store.
pub const CASH_REGISTER_KEY: &str = "cashRegister";

/// Key of the persisted customer list in the key-value store.
pub const CUSTOMERS_KEY: &str = "customers";

/// Number of entries in the report's best-selling product list.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

/// Stock level at or below which a product is flagged as running low.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum distinct products in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted unit price: R$ 1.000.000,00.
///
/// With the cart limits above, the largest possible cart total stays far
/// inside `i64` centavos.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest stock level a product may record.
pub const MAX_STOCK: i64 = 1_000_000;

//! # Domain Types
//!
//! Core domain types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku / barcode  │   │  items (frozen) │   │  sale_id (FK)   │       │
//! │  │  price_cents    │   │  status         │   │  method         │       │
//! │  │  stock          │   │  total_cents    │   │  amount_cents   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name, email    │   │  Completed      │   │  Cash           │       │
//! │  │  phone, doc     │   │  Cancelled      │   │  Card           │       │
//! │  └─────────────────┘   │  Pending        │   │  Pix            │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Products belong to the inventory store: the cart and the sale only hold
//! snapshots of a product's name and price, never the record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Stock Keeping Unit.
    pub sku: Option<String>,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Price in centavos.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: String,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

/// Fields supplied when creating or editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub category: String,
}

/// Catalog fields a product edit may change.
///
/// Stock is absent: it only moves through the inventory decrement and
/// restock operations, so an edit cannot overwrite a concurrent sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price_cents: i64,
    pub category: String,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// ## State Machine
/// ```text
/// Pending ──► Completed ──► Cancelled
/// ```
/// Only the cancellation flow moves a sale out of `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Sale has been paid and finalized.
    Completed,
    /// Sale was cancelled and its stock returned.
    Cancelled,
    /// Sale is awaiting payment confirmation.
    Pending,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment. The only method that touches the cash ledger.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Instant bank transfer.
    Pix,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Pix => "pix",
        }
    }

    #[inline]
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Actors
// =============================================================================

/// The operator performing register and checkout operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cashier {
    pub id: String,
    pub name: String,
}

impl Cashier {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Cashier {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Customer attached to a sale (denormalized id + name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable sale record.
///
/// ## Invariants
/// - `total_cents = subtotal_cents - discount_cents`, and `total_cents >= 0`
/// - `items` keep cart order and never change after creation
/// - `cancelled_at` is set only by the cancellation flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub items: Vec<SaleItem>,
    pub subtotal_cents: i64,
    /// Discount rate in basis points (1000 = 10%).
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub cashier_id: String,
    pub cashier_name: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == SaleStatus::Completed
    }

    /// Total units across all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in centavos at time of sale (frozen).
    pub unit_price_cents: i64,
    /// unit_price × quantity
    pub subtotal_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// The payment row written alongside a sale. Its amount equals the sale total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// CPF/CNPJ or other tax document.
    pub document: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn to_ref(&self) -> CustomerRef {
        CustomerRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Fields supplied when creating or editing a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Café 500g".to_string(),
            description: None,
            sku: Some("CAFE-500".to_string()),
            barcode: None,
            price_cents: 1890,
            stock,
            category: "Mercearia".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_sell() {
        let p = product(3);
        assert!(p.can_sell(3));
        assert!(!p.can_sell(4));
        assert!(!p.can_sell(0));
        assert_eq!(p.price().cents(), 1890);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Pix).unwrap(), "\"pix\"");
        assert_eq!(
            serde_json::to_string(&SaleStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(PaymentMethod::Card.to_string(), "card");
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::Pix.is_cash());
    }

    #[test]
    fn test_sale_serializes_camel_case() {
        let sale = Sale {
            id: "s-1".to_string(),
            items: vec![SaleItem {
                product_id: "p-1".to_string(),
                product_name: "Café 500g".to_string(),
                quantity: 2,
                unit_price_cents: 1890,
                subtotal_cents: 3780,
            }],
            subtotal_cents: 3780,
            discount_bps: 0,
            discount_cents: 0,
            total_cents: 3780,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            cashier_id: "c-1".to_string(),
            cashier_name: "Ana".to_string(),
            customer_id: None,
            customer_name: None,
            created_at: Utc::now(),
            cancelled_at: None,
        };

        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["paymentMethod"], "cash");
        assert_eq!(json["items"][0]["unitPriceCents"], 1890);
        assert_eq!(sale.total_quantity(), 2);
        assert!(sale.is_completed());
    }
}

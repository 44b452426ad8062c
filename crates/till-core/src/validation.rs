//! # Validation Module
//!
//! Field-level input checks for catalog and customer records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (before any write)                               │
//! │  ├── Required fields, lengths, formats                                 │
//! │  └── Bounded prices and stock                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain rules (cart.rs, ledger.rs, sale.rs)                   │
//! │  ├── Stock caps, register state, discount range                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_sku, validate_stock};
//!
//! validate_sku("CAFE-500").unwrap();
//! validate_stock(12).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{CustomerInput, ProductInput, ProductUpdate};
use crate::{MAX_PRICE_CENTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_SKU_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_sku;
///
/// assert!(validate_sku("CAFE-500").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a required display name (product or customer).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// Only the shape `local@domain.tld` is checked; deliverability is not.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in centavos.
///
/// ## Example
/// ```rust
/// use till_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level: `0..=MAX_STOCK`.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a product before insert.
pub fn validate_product(input: &ProductInput) -> ValidationResult<()> {
    validate_catalog_fields(&input.name, input.sku.as_deref(), input.price_cents, &input.category)?;
    validate_stock(input.stock)?;
    Ok(())
}

/// Validates a product edit.
pub fn validate_product_update(input: &ProductUpdate) -> ValidationResult<()> {
    validate_catalog_fields(&input.name, input.sku.as_deref(), input.price_cents, &input.category)
}

fn validate_catalog_fields(
    name: &str,
    sku: Option<&str>,
    price_cents: i64,
    category: &str,
) -> ValidationResult<()> {
    validate_name("name", name)?;
    if let Some(sku) = sku {
        validate_sku(sku)?;
    }
    validate_price_cents(price_cents)?;
    validate_name("category", category)?;
    Ok(())
}

/// Validates a customer before insert or update.
pub fn validate_customer(input: &CustomerInput) -> ValidationResult<()> {
    validate_name("name", &input.name)?;
    if let Some(email) = input.email.as_deref().filter(|e| !e.trim().is_empty()) {
        validate_email(email)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("CAFE-500").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Arroz 5kg").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("maria@example.com").is_ok());
        assert!(validate_email("maria").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("maria@example").is_err());
        assert!(validate_email("maria@.com").is_err());
    }

    #[test]
    fn test_validate_product() {
        let mut input = ProductInput {
            name: "Feijão 1kg".to_string(),
            description: None,
            sku: Some("FEIJAO-1KG".to_string()),
            barcode: None,
            price_cents: 899,
            stock: 40,
            category: "Mercearia".to_string(),
        };
        assert!(validate_product(&input).is_ok());

        input.stock = -1;
        assert!(matches!(
            validate_product(&input),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_upper_bounds() {
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents(i64::MAX / 2 + 1).is_err());

        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(matches!(
            validate_stock(MAX_STOCK + 1),
            Err(ValidationError::OutOfRange { max, .. }) if max == MAX_STOCK
        ));
    }

    #[test]
    fn test_validate_customer_ignores_blank_email() {
        let input = CustomerInput {
            name: "Maria".to_string(),
            email: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_customer(&input).is_ok());
    }
}

//! # Cart
//!
//! The mutable shopping cart owned by one cashier session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Method                 Cart Change            │
//! │  ──────────────           ──────                 ───────────            │
//! │                                                                         │
//! │  Pick product ───────────► add(&product) ──────► new line (qty 1)      │
//! │                                                  or qty + 1, ≤ cap     │
//! │                                                                         │
//! │  Change quantity ────────► set_quantity() ─────► qty clamped to cap    │
//! │                                                  qty ≤ 0 removes line  │
//! │                                                                         │
//! │  Remove ─────────────────► remove() ───────────► line dropped          │
//! │                                                                         │
//! │  Clear / Checkout ───────► clear() ────────────► empty                 │
//! │                                                                         │
//! │  NOTE: Only memory changes. Stock is never touched from here.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` and keep insertion order
//! - Every line has `1 <= quantity <= cap`, where the cap is
//!   `min(stock, MAX_ITEM_QUANTITY)` and stock is the level seen at add-time
//! - At most `MAX_CART_ITEMS` lines, each priced within `MAX_PRICE_CENTS`,
//!   so totals cannot overflow
//! - Totals are recomputed from the lines on every read

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_price_cents;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Highest quantity a line may hold for the given stock level.
#[inline]
fn quantity_cap(stock: i64) -> i64 {
    stock.min(MAX_ITEM_QUANTITY)
}

/// A line in the shopping cart.
///
/// ## Design Notes
/// Name and price are frozen when the product is first added. If the
/// product changes in the store afterwards, the line keeps the old values
/// and the sale records what the customer was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,

    /// Product name at time of adding (frozen)
    pub name: String,

    /// Price in centavos at time of adding (frozen)
    pub unit_price_cents: i64,

    pub quantity: i64,

    /// Stock observed the last time this product was added.
    pub stock: i64,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity: 1,
            stock: product.stock,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - stock ≤ 0: nothing changes, returns `OutOfStock`
    /// - price outside `0..=MAX_PRICE_CENTS`: nothing changes, returns `Validation`
    /// - not in cart: new line at quantity 1, or `CartTooLarge` when the
    ///   cart already has `MAX_CART_ITEMS` lines
    /// - already in cart: quantity + 1, capped at `product.stock` and
    ///   `MAX_ITEM_QUANTITY`
    ///
    /// Returns the line's quantity after the call.
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::Utc;
    /// # use till_core::{Cart, Product};
    /// # let now = Utc::now();
    /// # let product = Product {
    /// #     id: "p-1".into(), name: "Pão".into(), description: None, sku: None,
    /// #     barcode: None, price_cents: 50, stock: 2, category: "Padaria".into(),
    /// #     is_active: true, created_at: now, updated_at: now,
    /// # };
    /// let mut cart = Cart::new();
    /// assert_eq!(cart.add(&product).unwrap(), 1);
    /// assert_eq!(cart.add(&product).unwrap(), 2);
    /// assert_eq!(cart.add(&product).unwrap(), 2); // capped at stock
    /// ```
    pub fn add(&mut self, product: &Product) -> CoreResult<i64> {
        if product.stock <= 0 {
            return Err(CoreError::OutOfStock {
                product_id: product.id.clone(),
            });
        }

        validate_price_cents(product.price_cents)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.stock = product.stock;
            line.quantity = (line.quantity + 1).min(quantity_cap(product.stock));
            return Ok(line.quantity);
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_product(product));
        Ok(1)
    }

    /// Sets a line's quantity, clamped to `[0, min(stock, MAX_ITEM_QUANTITY)]`.
    ///
    /// A quantity ≤ 0 removes the line. Unknown ids are ignored.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else {
            return;
        };

        let clamped = quantity.min(quantity_cap(line.stock));
        if clamped <= 0 {
            self.remove(product_id);
        } else {
            line.quantity = clamped;
        }
    }

    /// Removes a line. Unknown ids are ignored.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line subtotals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Amount shown to the customer before a discount is chosen.
    ///
    /// Discounts are applied at checkout (see `SaleTotals`), so this equals
    /// [`Cart::subtotal`].
    pub fn total(&self) -> Money {
        self.subtotal()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

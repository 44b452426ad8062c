//! # Sale Building
//!
//! The pure half of checkout: totals, discount, and the immutable `Sale`.
//!
//! ## Checkout Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart [{A, qty 2, 10.00}, {B, qty 1, 5.00}]   discount 10%             │
//! │                                                                         │
//! │  subtotal = Σ line subtotal              = 2500                         │
//! │  discount = (2500 × 1000 + 5000) / 10000 =  250   (half up)            │
//! │  total    = subtotal - discount          = 2250                         │
//! │                                                                         │
//! │  Rejected: rate > 100%  or  total < 0   → InvalidDiscount              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The side-effecting half (stock decrements, persistence, compensation)
//! lives in `till-session::checkout`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountRate, Money};
use crate::types::{Cashier, CustomerRef, Payment, PaymentMethod, Sale, SaleItem, SaleStatus};

// =============================================================================
// Checkout Request
// =============================================================================

/// Payment metadata supplied by the cashier at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount: DiscountRate,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
}

impl CheckoutRequest {
    pub fn new(payment_method: PaymentMethod) -> Self {
        CheckoutRequest {
            payment_method,
            discount: DiscountRate::zero(),
            customer: None,
        }
    }

    pub fn with_discount(mut self, discount: DiscountRate) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_customer(mut self, customer: CustomerRef) -> Self {
        self.customer = Some(customer);
        self
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Subtotal, discount and total of a cart at checkout time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount_rate: DiscountRate,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// Computes totals for the cart's current lines.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Cart, DiscountRate, SaleTotals};
    ///
    /// let rate = DiscountRate::from_bps(1000).unwrap();
    /// let totals = SaleTotals::compute(&Cart::new(), rate).unwrap();
    /// assert!(totals.total.is_zero());
    /// ```
    pub fn compute(cart: &Cart, rate: DiscountRate) -> CoreResult<Self> {
        let subtotal = cart.subtotal();
        let discount = subtotal.percentage(rate);
        let total = subtotal - discount;

        if total.is_negative() {
            return Err(CoreError::invalid_discount(format!(
                "total would be {}",
                total
            )));
        }

        Ok(SaleTotals {
            subtotal,
            discount_rate: rate,
            discount,
            total,
        })
    }
}

// =============================================================================
// Sale Construction
// =============================================================================

/// Builds the immutable sale for a cart.
///
/// ## Checks
/// - `EmptyCart` if there are no lines
/// - `InvalidDiscount` from [`SaleTotals::compute`]
///
/// Items are snapshots of the cart lines in cart order. The sale gets a
/// fresh UUID v4 and status `completed`.
pub fn build_sale(
    cart: &Cart,
    request: &CheckoutRequest,
    cashier: &Cashier,
    now: DateTime<Utc>,
) -> CoreResult<Sale> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let totals = SaleTotals::compute(cart, request.discount)?;

    let items = cart
        .lines()
        .iter()
        .map(|line| SaleItem {
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            subtotal_cents: line.subtotal().cents(),
        })
        .collect();

    Ok(Sale {
        id: Uuid::new_v4().to_string(),
        items,
        subtotal_cents: totals.subtotal.cents(),
        discount_bps: totals.discount_rate.bps(),
        discount_cents: totals.discount.cents(),
        total_cents: totals.total.cents(),
        payment_method: request.payment_method,
        status: SaleStatus::Completed,
        cashier_id: cashier.id.clone(),
        cashier_name: cashier.name.clone(),
        customer_id: request.customer.as_ref().map(|c| c.id.clone()),
        customer_name: request.customer.as_ref().map(|c| c.name.clone()),
        created_at: now,
        cancelled_at: None,
    })
}

/// The single payment row for a sale: full total, sale's method.
pub fn payment_for(sale: &Sale) -> Payment {
    Payment {
        id: Uuid::new_v4().to_string(),
        sale_id: sale.id.clone(),
        method: sale.payment_method,
        amount_cents: sale.total_cents,
        created_at: sale.created_at,
    }
}

/// Checks that a sale may be cancelled and returns its cancelled form.
///
/// Only `completed → cancelled` is allowed.
pub fn cancel(sale: &Sale, at: DateTime<Utc>) -> CoreResult<Sale> {
    if sale.status != SaleStatus::Completed {
        return Err(CoreError::InvalidSaleStatus {
            sale_id: sale.id.clone(),
            current_status: sale.status.to_string(),
        });
    }

    let mut cancelled = sale.clone();
    cancelled.status = SaleStatus::Cancelled;
    cancelled.cancelled_at = Some(at);
    Ok(cancelled)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Produto {}", id),
            description: None,
            sku: None,
            barcode: None,
            price_cents,
            stock,
            category: "Geral".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_a2_b1() -> Cart {
        let mut cart = Cart::new();
        let a = product("A", 1000, 10);
        cart.add(&a).unwrap();
        cart.add(&a).unwrap();
        cart.add(&product("B", 500, 10)).unwrap();
        cart
    }

    fn cashier() -> Cashier {
        Cashier::new("u-1", "Ana")
    }

    #[test]
    fn test_totals_with_ten_percent_discount() {
        let rate = DiscountRate::from_bps(1000).unwrap();
        let totals = SaleTotals::compute(&cart_a2_b1(), rate).unwrap();

        assert_eq!(totals.subtotal.cents(), 2500);
        assert_eq!(totals.discount.cents(), 250);
        assert_eq!(totals.total.cents(), 2250);
    }

    #[test]
    fn test_discount_above_hundred_percent_rejected() {
        let err = DiscountRate::from_bps(15_000).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscount { .. }));

        // A request arriving as JSON is checked the same way
        let json = r#"{"paymentMethod":"cash","discount":15000}"#;
        assert!(serde_json::from_str::<CheckoutRequest>(json).is_err());
    }

    #[test]
    fn test_full_discount_gives_zero_total() {
        let rate = DiscountRate::from_bps(10_000).unwrap();
        let totals = SaleTotals::compute(&cart_a2_b1(), rate).unwrap();
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_build_sale_snapshots_cart() {
        let request = CheckoutRequest::new(PaymentMethod::Pix)
            .with_discount(DiscountRate::from_bps(1000).unwrap())
            .with_customer(CustomerRef {
                id: "c-1".to_string(),
                name: "Maria".to_string(),
            });

        let sale = build_sale(&cart_a2_b1(), &request, &cashier(), Utc::now()).unwrap();

        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].product_id, "A");
        assert_eq!(sale.items[0].quantity, 2);
        assert_eq!(sale.items[0].subtotal_cents, 2000);
        assert_eq!(sale.total_cents, sale.subtotal_cents - sale.discount_cents);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.customer_name.as_deref(), Some("Maria"));
        assert!(Uuid::parse_str(&sale.id).is_ok());
    }

    #[test]
    fn test_build_sale_empty_cart() {
        let request = CheckoutRequest::new(PaymentMethod::Cash);
        let err = build_sale(&Cart::new(), &request, &cashier(), Utc::now()).unwrap_err();
        assert_eq!(err, CoreError::EmptyCart);
    }

    #[test]
    fn test_sale_ids_are_unique() {
        let request = CheckoutRequest::new(PaymentMethod::Cash);
        let cart = cart_a2_b1();
        let a = build_sale(&cart, &request, &cashier(), Utc::now()).unwrap();
        let b = build_sale(&cart, &request, &cashier(), Utc::now()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_payment_matches_total() {
        let request = CheckoutRequest::new(PaymentMethod::Card);
        let sale = build_sale(&cart_a2_b1(), &request, &cashier(), Utc::now()).unwrap();
        let payment = payment_for(&sale);

        assert_eq!(payment.sale_id, sale.id);
        assert_eq!(payment.amount(), sale.total());
        assert_eq!(payment.method, PaymentMethod::Card);
    }

    #[test]
    fn test_cancel_only_from_completed() {
        let request = CheckoutRequest::new(PaymentMethod::Cash);
        let sale = build_sale(&cart_a2_b1(), &request, &cashier(), Utc::now()).unwrap();

        let cancelled = cancel(&sale, Utc::now()).unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let err = cancel(&cancelled, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSaleStatus { .. }));
    }
}

//! # Money Module
//!
//! Provides the `Money` type for monetary values and `DiscountRate` for
//! percentage discounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats: 0.1 + 0.2 = 0.30000000000000004                           │
//! │  A cart total of 25.00 with 10% off can come out as 22.499999...        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer centavos                                         │
//! │    2500 - (2500 × 1000 + 5000) / 10000 = 2250                           │
//! │    Rounding happens once, at a documented point                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1099); // R$ 10.99
//! let doubled = price * 2;             // R$ 21.98
//! let total = price + Money::from_cents(500);
//! assert_eq!(doubled.cents(), 2198);
//! assert_eq!(total.cents(), 1599);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences (e.g. balance minus withdrawal) may go
///   negative transiently; the ledger and sale rules reject negative results
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as a bare integer** of centavos
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► CartLine.unit_price ──► CartLine.subtotal
///                                                     │
/// Cart.subtotal ──► discount ──► Sale.total ──► Payment.amount
///                                     │
///                                     └──► CashMovement (sale) amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (reais and centavos).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `rate` of this amount, rounded half up to the centavo.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{DiscountRate, Money};
    ///
    /// let subtotal = Money::from_cents(1999);
    /// // 19.99 × 12.5% = 2.49875 → 2.50
    /// assert_eq!(subtotal.percentage(DiscountRate::from_bps(1250).unwrap()).cents(), 250);
    /// ```
    pub fn percentage(&self, rate: DiscountRate) -> Money {
        // i128 prevents overflow on large amounts
        let part = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, e.g. `120.00`.
///
/// ## Note
/// Currency symbols belong to the caller (see `SessionConfig::format_currency`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%, 10000 bps = 100%
///
/// Every constructor checks the range, deserialization included, so any
/// `DiscountRate` value lies in 0%..=100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(try_from = "u32")]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Upper bound: 100%.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points, rejecting anything above 100%.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_bps(1000).unwrap().bps(), 1000);
    /// assert!(DiscountRate::from_bps(15_000).is_err());
    /// ```
    pub fn from_bps(bps: u32) -> CoreResult<Self> {
        if bps > Self::MAX_BPS {
            return Err(CoreError::invalid_discount(format!(
                "{} bps is above {}",
                bps,
                Self::MAX_BPS
            )));
        }
        Ok(DiscountRate(bps))
    }

    /// Creates a rate from a percentage entered by the cashier (e.g. `12.5`).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_percentage(10.0).unwrap().bps(), 1000);
    /// assert!(DiscountRate::from_percentage(-1.0).is_err());
    /// assert!(DiscountRate::from_percentage(100.5).is_err());
    /// ```
    pub fn from_percentage(pct: f64) -> CoreResult<Self> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(CoreError::invalid_discount(format!(
                "{}% is outside 0..=100",
                pct
            )));
        }
        Ok(DiscountRate((pct * 100.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// No discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

impl TryFrom<u32> for DiscountRate {
    type Error = CoreError;

    fn try_from(bps: u32) -> CoreResult<Self> {
        DiscountRate::from_bps(bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        let subtotal = Money::from_cents(2500);
        let ten = DiscountRate::from_bps(1000).unwrap();
        assert_eq!(subtotal.percentage(ten).cents(), 250);

        // 0.05 × 10% = 0.005 → 0.01
        let tiny = Money::from_cents(5);
        assert_eq!(tiny.percentage(ten).cents(), 1);

        // 100% of anything is the whole amount
        let full = DiscountRate::from_bps(DiscountRate::MAX_BPS).unwrap();
        assert_eq!(subtotal.percentage(full), subtotal);
    }

    #[test]
    fn test_discount_rate_bounds() {
        assert!(matches!(
            DiscountRate::from_bps(15_000),
            Err(CoreError::InvalidDiscount { .. })
        ));
        assert!(DiscountRate::from_bps(10_001).is_err());
        assert_eq!(DiscountRate::from_bps(10_000).unwrap().bps(), 10_000);
        assert_eq!(DiscountRate::from_bps(0).unwrap(), DiscountRate::zero());
        assert!(matches!(
            DiscountRate::from_percentage(f64::NAN),
            Err(CoreError::InvalidDiscount { .. })
        ));
        assert_eq!(DiscountRate::from_percentage(12.5).unwrap().bps(), 1250);
    }

    #[test]
    fn test_discount_rate_deserialization_is_checked() {
        let rate: DiscountRate = serde_json::from_str("1250").unwrap();
        assert_eq!(rate.bps(), 1250);
        assert!(serde_json::from_str::<DiscountRate>("15000").is_err());
        assert_eq!(serde_json::to_string(&rate).unwrap(), "1250");
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_cents(12000)).unwrap();
        assert_eq!(json, "12000");
    }
}

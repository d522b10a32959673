//! # Money Module
//!
//! Provides the `Money` type for rupee amounts.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    1250.10 × 3 = 3750.2999999999997  ❌ WRONG!                          │
//! │                                                                         │
//! │  Laboratory quotations multiply prices by fractional quantities        │
//! │  (2.5 metres of boring, 0.75 days of sampling) so integer paise alone  │
//! │  cannot hold every intermediate value.                                  │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Exact base-10 arithmetic, explicit rounding to paise only where     │
//! │    the document says so (line totals, display).                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use docket_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::from_paise(125_010); // ₹1,250.10
//! let line = price.multiply_quantity(Decimal::new(3, 0));
//! assert_eq!(line, Money::from_paise(375_030));
//! assert_eq!(line.to_string(), "₹3,750.30");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A rupee amount held as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal, unrounded**: totals keep full precision (`subtotal × 9%`
///   is never rounded mid-computation) so recomputation is bit-identical
/// - **Signed**: balances due may go negative on overpayment
/// - **Serialized as a string**: `"1250.10"`, lossless through JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps an exact decimal rupee amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates an amount from paise (1/100 rupee).
    ///
    /// ```rust
    /// use docket_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1050).to_string(), "₹10.50");
    /// ```
    #[inline]
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, 2))
    }

    /// Creates an amount from whole rupees.
    #[inline]
    pub fn from_rupees(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Zero rupees.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// The underlying decimal value.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to two decimal places, half away from zero.
    ///
    /// This matches how printed documents show amounts: `0.125` → `0.13`.
    pub fn round_paise(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Whole-rupee part of the rounded absolute amount.
    ///
    /// ```rust
    /// use docket_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1234550).rupees_part(), 12345);
    /// ```
    pub fn rupees_part(&self) -> u128 {
        self.round_paise().0.abs().trunc().to_u128().unwrap_or(0)
    }

    /// Paise part (0-99) of the rounded absolute amount.
    pub fn paise_part(&self) -> u8 {
        let rounded = self.round_paise().0.abs();
        ((rounded - rounded.trunc()) * Decimal::ONE_HUNDRED)
            .to_u8()
            .unwrap_or(0)
    }

    /// Multiplies a unit price by a (possibly fractional) quantity and rounds
    /// to paise. This is the line-total rule: `round(price × qty, 2)`.
    ///
    /// ```rust
    /// use docket_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let unit = Money::from_paise(33_333); // ₹333.33
    /// let total = unit.multiply_quantity(Decimal::new(15, 1)); // × 1.5
    /// assert_eq!(total, Money::from_paise(50_000)); // 499.995 → 500.00
    /// ```
    pub fn multiply_quantity(&self, quantity: Decimal) -> Money {
        Money(self.0 * quantity).round_paise()
    }

    /// Applies a rate without rounding: `amount × rate / 100`.
    ///
    /// ```rust
    /// use docket_core::money::Money;
    /// use docket_core::types::Rate;
    ///
    /// let base = Money::from_rupees(9_000);
    /// assert_eq!(base.percent(Rate::from_bps(900)), Money::from_rupees(810));
    /// ```
    pub fn percent(&self, rate: Rate) -> Money {
        Money(self.0 * rate.fraction())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays the amount rounded to paise with Indian digit grouping.
///
/// `1234567.5` → `₹12,34,567.50`
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.round_paise().is_negative() { "-" } else { "" };
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            group_indian(self.rupees_part()),
            self.paise_part()
        )
    }
}

/// Groups digits as lakh/crore: last three digits, then pairs.
fn group_indian(value: u128) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
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
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise_and_parts() {
        let money = Money::from_paise(1_234_550);
        assert_eq!(money.rupees_part(), 12_345);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(Money::from_paise(123_456_750).to_string(), "₹12,34,567.50");
        assert_eq!(Money::from_rupees(100_000).to_string(), "₹1,00,000.00");
        assert_eq!(Money::from_rupees(999).to_string(), "₹999.00");
        assert_eq!(Money::from_rupees(1_000).to_string(), "₹1,000.00");
        assert_eq!(Money::zero().to_string(), "₹0.00");
        assert_eq!(Money::from_paise(-55_050).to_string(), "-₹550.50");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let value = Money::from_decimal(Decimal::new(125, 3)); // 0.125
        assert_eq!(value.round_paise(), Money::from_paise(13));

        let negative = Money::from_decimal(Decimal::new(-125, 3));
        assert_eq!(negative.round_paise(), Money::from_paise(-13));
    }

    #[test]
    fn test_multiply_fractional_quantity() {
        let unit = Money::from_paise(125_010);
        assert_eq!(
            unit.multiply_quantity(Decimal::new(25, 1)),
            Money::from_paise(312_525)
        );
    }

    #[test]
    fn test_percent_is_unrounded() {
        let base = Money::from_paise(1_001); // ₹10.01
        let tax = base.percent(Rate::from_bps(900));
        assert_eq!(tax.amount(), Decimal::new(9_009, 4)); // 0.9009
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_rupees(1_000);
        let b = Money::from_rupees(250);
        assert_eq!(a + b, Money::from_rupees(1_250));
        assert_eq!(a - b, Money::from_rupees(750));
        assert_eq!(-(b - a), Money::from_rupees(750));

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total, Money::from_rupees(1_500));
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_paise(1_050)).unwrap();
        assert_eq!(json, "\"10.50\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_paise(1_050));
    }
}

//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    180 * 0.1 = 18.000000000000004                                       │
//! │    platform fee + provider earnings drifts away from the total          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    18000 * 1000 bps / 10000 = 1800 exactly                              │
//! │    Every "round to 2 decimals" is an explicit half-up division          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rihla_core::money::Money;
//! use rihla_core::Rate;
//!
//! let price = Money::from_cents(20000); // 200.00
//! let fee = price.percentage(Rate::from_bps(1000)); // 10%
//! assert_eq!(fee.cents(), 2000);
//! assert_eq!(fee.to_string(), "20.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;
use crate::BPS_SCALE;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (piastres, halalas, cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Subtraction never panics on intermediate values
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as a bare integer**: JSON carries minor units
///
/// ## Where Money is Used
/// ```text
/// Service base price ──► PriceBreakdown.original_price
///                              │
///            coupon ──► discount_amount ──► final_price
///                                               │
///                          ┌────────────────────┴───────────────┐
///                          ▼                                    ▼
///                   platform_fee                        provider_earnings
///                          │                                    │
///                          └──────────► Tax QR total ◄──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use rihla_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
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

    /// Returns `rate` of this amount, rounded half-up to the minor unit.
    ///
    /// This is the "round(amount * percent / 100, 2)" of the pricing rules,
    /// done in integer math: `(cents * bps + 5000) / 10000`.
    ///
    /// ## Example
    /// ```rust
    /// use rihla_core::money::Money;
    /// use rihla_core::Rate;
    ///
    /// let price = Money::from_cents(1000); // 10.00
    /// let fee = price.percentage(Rate::from_bps(825)); // 8.25%
    /// // 10.00 × 8.25% = 0.825 → rounds to 0.83
    /// assert_eq!(fee.cents(), 83);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        // i128 so that large amounts times 10_000 cannot overflow
        Money::from_cents(div_round_half_up(
            self.0 as i128 * rate.bps() as i128,
            BPS_SCALE as i128,
        ) as i64)
    }

    /// Returns the tax contained in a tax-inclusive amount.
    ///
    /// `tax = amount * bps / (10000 + bps)`, rounded half-up.
    ///
    /// ## Example
    /// ```rust
    /// use rihla_core::money::Money;
    /// use rihla_core::Rate;
    ///
    /// let total = Money::from_cents(11500); // 115.00 incl. 15% VAT
    /// assert_eq!(total.included_tax(Rate::from_bps(1500)).cents(), 1500);
    /// ```
    pub fn included_tax(&self, rate: Rate) -> Money {
        let denominator = BPS_SCALE as i128 + rate.bps() as i128;
        Money::from_cents(div_round_half_up(
            self.0 as i128 * rate.bps() as i128,
            denominator,
        ) as i64)
    }
}

/// Integer division rounding halves away from zero. `d` must be positive.
fn div_round_half_up(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        (n - d / 2) / d
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, `"180.00"`.
///
/// This exact format is what goes into tax QR payloads and notifications;
/// currency symbols are left to the frontend.
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
        assert_eq!(Money::from_cents(18000).to_string(), "180.00");
        assert_eq!(Money::from_cents(505).to_string(), "5.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);

        let mut c = a;
        c -= b;
        c += Money::from_cents(1);
        assert_eq!(c.cents(), 501);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 0.05 × 10% = 0.005 → 0.01
        assert_eq!(Money::from_cents(5).percentage(Rate::from_bps(1000)).cents(), 1);
        // 0.04 × 10% = 0.004 → 0.00
        assert_eq!(Money::from_cents(4).percentage(Rate::from_bps(1000)).cents(), 0);
        // 200.00 × 10% = 20.00
        assert_eq!(Money::from_cents(20000).percentage(Rate::from_bps(1000)).cents(), 2000);
    }

    #[test]
    fn test_percentage_does_not_overflow() {
        let huge = Money::from_cents(i64::MAX / 2);
        let all = huge.percentage(Rate::from_bps(10_000));
        assert_eq!(all, huge);
    }

    #[test]
    fn test_included_tax() {
        // 100.00 incl. 15% → 13.04 (13.0434...)
        assert_eq!(Money::from_cents(10000).included_tax(Rate::from_bps(1500)).cents(), 1304);
        assert_eq!(Money::from_cents(0).included_tax(Rate::from_bps(1500)).cents(), 0);
        assert_eq!(Money::from_cents(10000).included_tax(Rate::zero()).cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_cents(18000)).unwrap();
        assert_eq!(json, "18000");
    }
}

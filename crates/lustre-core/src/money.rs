//! # Money Module
//!
//! The `Money` type: every price, subtotal, tax amount and tendered sum in
//! Lustre POS is an integer count of minor units (cents).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Floating point totals drift:                                           │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A 15% tax on Rs 33.33 computed in floats, then summed over a day,     │
//! │  no longer matches the receipts that were printed.                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    3333 cents × 1500 bps = 499.95 → 500 cents (half-up, explicit)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lustre_core::money::Money;
//!
//! let lipstick = Money::from_cents(50_000); // Rs 500.00
//! let line = lipstick.multiply_quantity(2).unwrap(); // Rs 1,000.00
//! assert_eq!(line.cents(), 100_000);
//!
//! // Overflow is an error, never a wrapped or panicking total
//! assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  StockItem.price_cents ──► CartLine.unit_price ──► line total           │
/// │                                                                         │
/// │  Σ line totals = subtotal ──► tax (bps, half-up) ──► total              │
/// │                                                                         │
/// │  total ──► loyalty points (floor(total / point value))                  │
/// │        ──► change due (tendered − total)                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use lustre_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (rupees, dollars...).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax with half-up rounding in minor units.
    ///
    /// ## Implementation
    /// Integer math only: `(amount * bps + 5000) / 10000`.
    /// The +5000 is half of the 10000 bps denominator.
    ///
    /// ## Example
    /// ```rust
    /// use lustre_core::money::Money;
    /// use lustre_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(100_000); // 1,000.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1500));
    /// assert_eq!(tax.cents(), 15_000);           // 150.00
    ///
    /// // 33.33 × 15% = 4.9995 → 5.00
    /// let odd = Money::from_cents(3333).calculate_tax(TaxRate::from_bps(1500));
    /// assert_eq!(odd.cents(), 500);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 so large subtotals cannot overflow the intermediate product
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Errors
    /// `AmountOverflow` when the product does not fit in `i64` cents.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> CoreResult<Money> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Adds two amounts, failing instead of wrapping.
    #[inline]
    pub fn checked_add(&self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// How many whole `unit`s fit in this amount (floor).
    ///
    /// Used for loyalty: one point per full `point_value` spent.
    /// Zero or negative units yield zero rather than panicking.
    ///
    /// ```rust
    /// use lustre_core::money::Money;
    ///
    /// let total = Money::from_cents(115_000);       // 1,150.00
    /// assert_eq!(total.whole_units_of(Money::from_cents(20_000)), 5);
    /// ```
    pub fn whole_units_of(&self, unit: Money) -> i64 {
        if !unit.is_positive() || !self.is_positive() {
            return 0;
        }
        self.0 / unit.0
    }

    /// Subtraction clamped at zero.
    ///
    /// `tendered.saturating_sub(total)` is the change owed to the customer.
    #[inline]
    pub fn saturating_sub(&self, other: Money) -> Money {
        if self.0 > other.0 {
            Money(self.0 - other.0)
        } else {
            Money::zero()
        }
    }

    /// Formats the amount for display with a currency symbol and
    /// thousands separators, e.g. `Rs 1,150.00`.
    ///
    /// `decimals` of 0 drops the minor part entirely.
    pub fn format_with(&self, symbol: &str, decimals: u8) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let major = group_thousands(self.major().unsigned_abs());
        if decimals == 0 {
            format!("{sign}{symbol} {major}")
        } else {
            format!("{sign}{symbol} {major}.{:02}", self.minor())
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `major.minor` rendering without a symbol. Receipts use
/// [`Money::format_with`] instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
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

//! # Pricing Engine
//!
//! Derives subtotal, tax and total from a cart. Pure and recomputed on every
//! call: nothing here is cached, so totals can never drift from the cart.
//!
//! ```text
//!   subtotal = Σ unit_price × quantity
//!   tax      = round_half_up(subtotal × rate)      (in minor units)
//!   total    = subtotal + tax
//! ```
//!
//! Tax is applied once to the subtotal rather than per line, so a receipt's
//! tax always equals the rate applied to its printed subtotal.
//!
//! Every product and sum is checked: a cart whose total cannot be
//! represented yields `AmountOverflow` instead of a wrapped figure.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::TaxRate;

/// Snapshot of the cart's totals, as shown on the payment panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl Totals {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Change owed for `tendered`: `tendered − total`, or zero when the
    /// customer has not handed over enough.
    pub fn change_due(&self, tendered: Money) -> Money {
        tendered.saturating_sub(self.total())
    }
}

/// Stateless calculator bound to one tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingEngine {
    rate: TaxRate,
}

impl PricingEngine {
    pub const fn new(rate: TaxRate) -> Self {
        PricingEngine { rate }
    }

    pub const fn rate(&self) -> TaxRate {
        self.rate
    }

    pub fn subtotal(&self, cart: &Cart) -> CoreResult<Money> {
        cart.lines()
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total()?))
    }

    pub fn tax(&self, cart: &Cart) -> CoreResult<Money> {
        Ok(self.subtotal(cart)?.calculate_tax(self.rate))
    }

    pub fn total(&self, cart: &Cart) -> CoreResult<Money> {
        Ok(self.totals(cart)?.total())
    }

    /// All totals in one pass.
    pub fn totals(&self, cart: &Cart) -> CoreResult<Totals> {
        let subtotal = self.subtotal(cart)?;
        let tax = subtotal.calculate_tax(self.rate);
        let total = subtotal.checked_add(tax)?;
        Ok(Totals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

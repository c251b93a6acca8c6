//! # Cart
//!
//! The operator's in-progress selection: an ordered list of lines, at most one
//! per stock item.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Operation               Cart Change           │
//! │  ───────────────          ─────────               ───────────           │
//! │                                                                         │
//! │  Tap product tile ───────► add_item() ──────────► push(qty 1) or no-op │
//! │                                                                         │
//! │  +/- or type qty ────────► set_quantity() ──────► qty = n, remove if <1│
//! │                                                                         │
//! │  Tap trash icon ─────────► remove_item() ───────► retain(!= id)        │
//! │                                                                         │
//! │  Sale completed ─────────► clear() ─────────────► lines.clear()        │
//! │                                                                         │
//! │  A rejected operation leaves the cart exactly as it was.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ceiling
//! Each line remembers the stock quantity seen when it was added. That is an
//! optimistic hint for the quantity stepper; the checkout batch re-checks the
//! live row before decrementing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{SaleLine, StockItem};
use crate::validation::validate_quantity;
use crate::MAX_CART_ITEMS;

/// One product and quantity in the cart.
///
/// Price and cost are frozen when the line is added: editing the stock item
/// afterwards does not change what this sale charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Stock item id; also the line id.
    pub stock_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: Option<i64>,
    /// Stock on hand when the line was added. `quantity <= ceiling`.
    pub ceiling: i64,
}

impl CartLine {
    fn from_stock_item(item: &StockItem) -> Self {
        CartLine {
            stock_id: item.id.clone(),
            name: item.product_name.clone(),
            quantity: 1,
            unit_price_cents: item.price_cents,
            unit_cost_cents: item.cost_cents,
            ceiling: item.quantity,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price().multiply_quantity(self.quantity)
    }

    /// Snapshot written into the sale document.
    pub fn to_sale_line(&self) -> SaleLine {
        SaleLine {
            stock_id: self.stock_id.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            unit_cost_cents: self.unit_cost_cents,
        }
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - At most one line per `stock_id`
/// - Every line has `1 <= quantity <= min(ceiling, MAX_ITEM_QUANTITY)`
/// - At most [`MAX_CART_ITEMS`] lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of `item` as a new line.
    ///
    /// ## Behavior
    /// - Line already present: no-op, returns `Ok(false)`. Quantity changes go
    ///   through [`Cart::set_quantity`].
    /// - Item has zero stock: `OutOfStock`.
    /// - Cart full: `CartTooLarge`.
    /// - Otherwise appends `quantity = 1` and returns `Ok(true)`.
    pub fn add_item(&mut self, item: &StockItem) -> CoreResult<bool> {
        if self.contains(&item.id) {
            return Ok(false);
        }

        if item.quantity <= 0 {
            return Err(CoreError::OutOfStock {
                name: item.product_name.clone(),
            });
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_stock_item(item));
        Ok(true)
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - `quantity < 1`: same as [`Cart::remove_item`]
    /// - Unknown line: `LineNotFound`
    /// - `quantity > MAX_ITEM_QUANTITY`: `Validation`, no mutation
    /// - `quantity > ceiling`: `QuantityExceedsStock`, no mutation
    pub fn set_quantity(&mut self, stock_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity < 1 {
            self.remove_item(stock_id);
            return Ok(());
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.stock_id == stock_id)
            .ok_or_else(|| CoreError::LineNotFound(stock_id.to_string()))?;

        validate_quantity(quantity)?;

        if quantity > line.ceiling {
            return Err(CoreError::QuantityExceedsStock {
                name: line.name.clone(),
                available: line.ceiling,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        Ok(())
    }

    /// Removes the line for `stock_id`. Returns whether anything was removed.
    pub fn remove_item(&mut self, stock_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.stock_id != stock_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, stock_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.stock_id == stock_id)
    }

    pub fn contains(&self, stock_id: &str) -> bool {
        self.line(stock_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities over all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn to_sale_lines(&self) -> Vec<SaleLine> {
        self.lines.iter().map(CartLine::to_sale_line).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stock(id: &str, price_cents: i64, quantity: i64) -> StockItem {
        let now = Utc::now();
        StockItem {
            id: id.to_string(),
            vendor_id: "vendor-1".to_string(),
            product_name: format!("Item {id}"),
            quantity,
            cost_cents: Some(price_cents / 2),
            price_cents,
            category: None,
            low_stock_threshold: 5,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_item_snapshots_stock() {
        let mut cart = Cart::new();
        assert!(cart.add_item(&stock("a", 50_000, 10)).unwrap());

        let line = cart.line("a").unwrap();
        assert_eq!(line.quantity, 1);
        assert_eq!(line.unit_price_cents, 50_000);
        assert_eq!(line.unit_cost_cents, Some(25_000));
        assert_eq!(line.ceiling, 10);
    }

    #[test]
    fn test_add_item_is_idempotent_per_id() {
        let mut cart = Cart::new();
        let item = stock("a", 50_000, 10);
        cart.add_item(&item).unwrap();
        cart.set_quantity("a", 3).unwrap();

        assert!(!cart.add_item(&item).unwrap());
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.line("a").unwrap().quantity, 3);
    }

    #[test]
    fn test_add_out_of_stock_rejected() {
        let mut cart = Cart::new();
        let err = cart.add_item(&stock("a", 1_000, 0)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_size_cap() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&stock(&i.to_string(), 100, 1)).unwrap();
        }
        let err = cart.add_item(&stock("overflow", 100, 1)).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { max: MAX_CART_ITEMS }));
        assert_eq!(cart.item_count(), MAX_CART_ITEMS);
    }

    #[test]
    fn test_set_quantity_above_ceiling_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(&stock("a", 20_000, 3)).unwrap();
        cart.set_quantity("a", 2).unwrap();
        let before = cart.clone();

        let err = cart.set_quantity("a", 5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::QuantityExceedsStock { available: 3, requested: 5, .. }
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_above_line_cap_rejected() {
        use crate::MAX_ITEM_QUANTITY;

        let mut cart = Cart::new();
        cart.add_item(&stock("a", 100, 5_000)).unwrap();
        cart.set_quantity("a", MAX_ITEM_QUANTITY).unwrap();
        let before = cart.clone();

        let err = cart.set_quantity("a", MAX_ITEM_QUANTITY + 1).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let mut cart = Cart::new();
        cart.add_item(&stock("x", i64::MAX / 2 + 1, 2)).unwrap();
        cart.set_quantity("x", 2).unwrap();

        let line = cart.line("x").unwrap();
        assert!(matches!(line.line_total(), Err(CoreError::AmountOverflow)));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut a = Cart::new();
        a.add_item(&stock("a", 100, 5)).unwrap();
        a.add_item(&stock("b", 200, 5)).unwrap();
        let mut b = a.clone();

        a.set_quantity("a", 0).unwrap();
        b.remove_item("a");

        assert_eq!(a, b);
        assert_eq!(a.item_count(), 1);
        assert!(!a.contains("a"));
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.set_quantity("missing", 2),
            Err(CoreError::LineNotFound(_))
        ));
        // Removal path never errors
        assert!(cart.set_quantity("missing", 0).is_ok());
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        for id in ["c", "a", "b"] {
            cart.add_item(&stock(id, 100, 5)).unwrap();
        }
        let ids: Vec<_> = cart.lines().iter().map(|l| l.stock_id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);

        let sale_lines = cart.to_sale_lines();
        assert_eq!(sale_lines[0].stock_id, "c");
        assert_eq!(cart.total_quantity(), 3);
    }
}

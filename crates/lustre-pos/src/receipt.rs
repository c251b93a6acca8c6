//! # Receipt
//!
//! A receipt is derived from a committed [`Sale`], never from the cart, so
//! what is printed is exactly what was stored.
//!
//! ## Rendered Layout (width 40)
//! ```text
//!               Lustre Beauty
//! Ref: #M482913
//! Date: 2026-10-18 14:03 UTC
//! ----------------------------------------
//! Lipstick A
//!   2 x Rs 500.00               Rs 1,000.00
//! ----------------------------------------
//! Subtotal                      Rs 1,000.00
//! Tax                             Rs 150.00
//! TOTAL                         Rs 1,150.00
//! Payment                              Cash
//! Tendered                      Rs 2,000.00
//! Change                          Rs 850.00
//! Customer                           Nimali
//! Points earned                           5
//! ----------------------------------------
//!          Thank you, come again!
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use lustre_core::{Money, PaymentMethod, Sale};

/// Narrowest layout that still fits a label and an amount.
const MIN_WIDTH: usize = 24;

/// Display settings taken from the terminal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSettings {
    pub store_name: String,
    pub currency_symbol: String,
    pub decimals: u8,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            store_name: "Lustre Beauty".to_string(),
            currency_symbol: "Rs".to_string(),
            decimals: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Printable summary of one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub store_name: String,
    pub reference: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
    pub points_earned: i64,
    #[serde(skip)]
    #[ts(skip)]
    currency_symbol: String,
    #[serde(skip)]
    #[ts(skip)]
    decimals: u8,
}

impl Receipt {
    pub fn from_sale(sale: &Sale, settings: &ReceiptSettings) -> Self {
        Receipt {
            store_name: settings.store_name.clone(),
            reference: sale.reference.clone(),
            timestamp: sale.created_at,
            lines: sale
                .lines
                .iter()
                .map(|l| ReceiptLine {
                    name: l.name.clone(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                    line_total_cents: l.line_total().cents(),
                })
                .collect(),
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            payment_method: sale.payment_method,
            customer_name: sale.customer_name.clone(),
            tendered_cents: None,
            change_cents: None,
            points_earned: 0,
            currency_symbol: settings.currency_symbol.clone(),
            decimals: settings.decimals,
        }
    }

    /// Records the cash handed over; change is `tendered − total`, floored
    /// at zero.
    pub fn with_tendered(mut self, tendered: Money) -> Self {
        let change = tendered.saturating_sub(Money::from_cents(self.total_cents));
        self.tendered_cents = Some(tendered.cents());
        self.change_cents = Some(change.cents());
        self
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points_earned = points;
        self
    }

    /// Plain-text lines, each at most `width` characters where the content
    /// allows it. Widths below 24 are raised to 24.
    pub fn render(&self, width: usize) -> Vec<String> {
        let width = width.max(MIN_WIDTH);
        let rule = "-".repeat(width);
        let mut out = Vec::with_capacity(self.lines.len() * 2 + 14);

        out.push(center(&self.store_name, width));
        out.push(format!("Ref: {}", self.reference));
        out.push(format!("Date: {}", self.timestamp.format("%Y-%m-%d %H:%M UTC")));
        out.push(rule.clone());

        for line in &self.lines {
            out.push(line.name.clone());
            let qty = format!(
                "  {} x {}",
                line.quantity,
                self.money(line.unit_price_cents)
            );
            out.push(columns(&qty, &self.money(line.line_total_cents), width));
        }

        out.push(rule.clone());
        out.push(columns("Subtotal", &self.money(self.subtotal_cents), width));
        out.push(columns("Tax", &self.money(self.tax_cents), width));
        out.push(columns("TOTAL", &self.money(self.total_cents), width));
        out.push(columns("Payment", payment_label(self.payment_method), width));

        if let (Some(tendered), Some(change)) = (self.tendered_cents, self.change_cents) {
            out.push(columns("Tendered", &self.money(tendered), width));
            out.push(columns("Change", &self.money(change), width));
        }

        out.push(columns("Customer", &self.customer_name, width));
        if self.points_earned > 0 {
            out.push(columns("Points earned", &self.points_earned.to_string(), width));
        }

        out.push(rule);
        out.push(center("Thank you, come again!", width));
        out
    }

    fn money(&self, cents: i64) -> String {
        Money::from_cents(cents).format_with(&self.currency_symbol, self.decimals)
    }
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Card => "Card",
        PaymentMethod::Online => "Online",
    }
}

/// Left text and right text separated by padding; a single space when
/// they do not fit.
fn columns(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    format!("{left}{}{right}", " ".repeat(gap))
}

fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustre_core::SaleLine;

    fn sale() -> Sale {
        Sale {
            id: "s1".into(),
            vendor_id: "v1".into(),
            reference: "#M482913".into(),
            lines: vec![SaleLine {
                stock_id: "lipstick-a".into(),
                name: "Lipstick A".into(),
                quantity: 2,
                unit_price_cents: 50_000,
                unit_cost_cents: None,
            }],
            subtotal_cents: 100_000,
            tax_cents: 15_000,
            total_cents: 115_000,
            payment_method: PaymentMethod::Cash,
            customer_name: "Nimali".into(),
            customer_phone: "0771234567".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_sale_copies_stored_figures() {
        let receipt = Receipt::from_sale(&sale(), &ReceiptSettings::default())
            .with_tendered(Money::from_cents(200_000))
            .with_points(5);

        assert_eq!(receipt.lines[0].line_total_cents, 100_000);
        assert_eq!(receipt.total_cents, 115_000);
        assert_eq!(receipt.change_cents, Some(85_000));
        assert_eq!(receipt.points_earned, 5);
    }

    #[test]
    fn test_render() {
        let receipt = Receipt::from_sale(&sale(), &ReceiptSettings::default())
            .with_tendered(Money::from_cents(200_000))
            .with_points(5);
        let lines = receipt.render(40);

        assert_eq!(lines[0].trim(), "Lustre Beauty");
        assert!(lines.contains(&"Ref: #M482913".to_string()));
        assert!(lines.iter().all(|l| l.chars().count() <= 40));

        let total = lines.iter().find(|l| l.starts_with("TOTAL")).unwrap();
        assert!(total.ends_with("Rs 1,150.00"));
        assert_eq!(total.chars().count(), 40);

        assert!(lines.iter().any(|l| l.starts_with("Change") && l.ends_with("Rs 850.00")));
        assert!(lines.iter().any(|l| l.starts_with("Points earned") && l.ends_with('5')));
    }

    #[test]
    fn test_short_tender_gives_no_change_and_guest_has_no_points_line() {
        let mut s = sale();
        s.customer_name = "Guest".into();
        s.customer_phone = String::new();

        let receipt = Receipt::from_sale(&s, &ReceiptSettings::default())
            .with_tendered(Money::from_cents(100_000));
        assert_eq!(receipt.change_cents, Some(0));

        let lines = receipt.render(10);
        assert!(lines.iter().any(|l| l.starts_with("Customer") && l.ends_with("Guest")));
        assert!(!lines.iter().any(|l| l.starts_with("Points earned")));
    }
}

//! # Domain Types
//!
//! Core domain types used throughout Lustre POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │      Sale       │   │ CustomerProfile │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  vendor_id      │   │  reference #M.. │   │  vendor_id      │       │
//! │  │  product_name   │   │  lines[]        │   │  phone (unique) │       │
//! │  │  quantity       │   │  total_cents    │   │  purchase dates │       │
//! │  │  price_cents    │   │  payment_method │   └────────┬────────┘       │
//! │  └─────────────────┘   └────────┬────────┘            │                │
//! │                                 │                     │                │
//! │                                 └──────────┬──────────┘                │
//! │                                            ▼                           │
//! │                                 ┌─────────────────┐                    │
//! │                                 │   PointGrant    │  ledger entry;     │
//! │                                 │  points_earned  │  balance = Σ       │
//! │                                 └─────────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenancy
//! Every persisted entity carries a `vendor_id`. The vendor is supplied by the
//! identity provider and every store query is scoped by it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1500 bps = 15%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (config convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// A sellable unit owned by one vendor.
///
/// `quantity` never goes negative as the result of a sale: the checkout batch
/// uses a conditional decrement and the table carries `CHECK (quantity >= 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockItem {
    pub id: String,
    pub vendor_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit cost, when the vendor recorded one.
    pub cost_cents: Option<i64>,
    /// Unit selling price.
    pub price_cents: i64,
    pub category: Option<String>,
    pub low_stock_threshold: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Option<Money> {
        self.cost_cents.map(Money::from_cents)
    }

    /// Derived availability used by the product grid badges.
    ///
    /// ```text
    ///   quantity == 0                  → OutOfStock
    ///   0 < quantity < threshold       → LowStock
    ///   quantity >= threshold          → InStock
    /// ```
    pub fn status(&self) -> StockStatus {
        if self.quantity <= 0 {
            StockStatus::OutOfStock
        } else if self.quantity < self.low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

/// Availability bucket derived from quantity and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

/// Input for creating a stock item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStockItem {
    pub product_name: String,
    pub quantity: i64,
    pub cost_cents: Option<i64>,
    pub price_cents: i64,
    pub category: Option<String>,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Partial update for a stock item. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockItemUpdate {
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub cost_cents: Option<i64>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub low_stock_threshold: Option<i64>,
}

impl StockItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.quantity.is_none()
            && self.cost_cents.is_none()
            && self.price_cents.is_none()
            && self.category.is_none()
            && self.low_stock_threshold.is_none()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Online => "online",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "online" => Ok(PaymentMethod::Online),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "online".into()],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a persisted sale. Snapshot of the cart line at finalize time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub stock_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// Omitted from the stored document when the item had no recorded cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost_cents: Option<i64>,
}

impl SaleLine {
    /// Stored lines were priced through the checked cart path, so this
    /// saturates rather than failing.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents.saturating_mul(self.quantity))
    }
}

/// An immutable record of a completed checkout.
///
/// `total = subtotal + tax`, `subtotal = Σ qty × price`. Never updated after
/// insert; the same document lands in `sales` and, for named customers, in
/// `customer_sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub vendor_id: String,
    /// Human-facing reference printed on the receipt, e.g. `#M482913`.
    pub reference: String,
    pub lines: Vec<SaleLine>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub customer_phone: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Builds the reference for a sale created at `at`: `#M` followed by the
    /// last six digits of the epoch seconds.
    pub fn reference_for(at: DateTime<Utc>) -> String {
        let secs = at.timestamp().rem_euclid(1_000_000);
        format!("#M{secs:06}")
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Whether the sale belongs in the per-customer history collection.
    pub fn is_attributed(&self) -> bool {
        self.customer_name != crate::GUEST_CUSTOMER_NAME && !self.customer_phone.is_empty()
    }
}

// =============================================================================
// Customers & Loyalty
// =============================================================================

/// A loyalty profile. `phone` is unique per vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerProfile {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    pub phone: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub first_purchase_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub last_purchase_at: Option<DateTime<Utc>>,
}

/// A single loyalty ledger entry. A customer's balance is the sum of
/// `points_earned` over their entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PointGrant {
    pub id: String,
    pub vendor_id: String,
    pub customer_id: String,
    pub sale_id: String,
    pub reference: String,
    pub points_earned: i64,
    pub purchase_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Result of a successful phone lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerMatch {
    pub profile: CustomerProfile,
    pub points_balance: i64,
    /// Most recent attributed sales, newest first.
    pub history: Vec<Sale>,
}

/// Loyalty points earned for a purchase: one per whole `point_value`.
pub fn points_for(total: Money, point_value: Money) -> i64 {
    total.whole_units_of(point_value)
}

// =============================================================================
// Unit Tests
// =============================================================================

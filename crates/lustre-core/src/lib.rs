//! # lustre-core: Pure Business Logic for Lustre POS
//!
//! Everything the point-of-sale workflow decides without touching the store:
//! cart rules, pricing, catalog derivations, loyalty math and validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lustre POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Presentation layer (web UI)                    │   │
//! │  │    Product grid ──► Cart ──► Payment modal ──► Receipt          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 lustre-pos (session layer)                      │   │
//! │  │    CheckoutCoordinator, CustomerLookup, inventory, config       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lustre-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ pricing │ │ catalog │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 lustre-db (document store)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockItem, Sale, CustomerProfile, PointGrant)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The operator's in-progress selection
//! - [`pricing`] - Subtotal, tax and total derived from a cart
//! - [`catalog`] - In-memory view of a vendor's sellable stock
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use lustre_core::money::Money;
//! use lustre_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(100_000); // 1,000.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1500)); // 15%
//!
//! assert_eq!(tax.cents(), 15_000);
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartLine};
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PricingEngine, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Catches a mistyped stepper value (1000 instead of 10) before it reaches
/// the payment step.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest on-hand quantity a stock item may record.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Highest unit price or cost accepted, in cents (1,000,000,000.00).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_CART_ITEMS`] this keeps every cart
/// total far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Customer name used when no loyalty profile is attached to a sale.
pub const GUEST_CUSTOMER_NAME: &str = "Guest";

/// Sentinel category that disables category filtering in the product grid.
pub const ALL_CATEGORIES: &str = "All Categories";

/// Low-stock threshold applied when a stock item does not carry its own.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

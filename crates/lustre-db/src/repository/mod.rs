//! # Repository Module
//!
//! Store access for Lustre POS, one repository per collection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  lustre-pos operation                                                  │
//! │       │                                                                 │
//! │       │  db.stock().list_for_vendor("vendor-1")                        │
//! │       ▼                                                                 │
//! │  StockRepository          ── stock_items                               │
//! │  SaleRepository           ── sales, customer_sales, checkout batch     │
//! │  CustomerRepository       ── customers                                 │
//! │  LoyaltyRepository        ── loyalty_points (read side)                │
//! │       │                                                                 │
//! │       │  SQL, always scoped by vendor_id                               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository holds a clone of the pool; obtaining one is cheap.

pub mod customer;
pub mod loyalty;
pub mod sale;
pub mod stock;

//! # Catalog
//!
//! In-memory view of a vendor's sellable stock, loaded once per operator
//! session and queried by the product grid.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session start ──► load(vendor) ──► Catalog { items }                   │
//! │                                        │                                │
//! │        ┌───────────────────────────────┼───────────────────────┐        │
//! │        ▼                               ▼                       ▼        │
//! │   categories()                 filter(search, cat)      low_stock_items │
//! │   "All Categories", Lips, ...  grid tiles               alert badge     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog is not refreshed after a sale. Quantities shown may be stale
//! until the next load; the checkout batch always re-checks live stock.

use crate::types::{StockItem, StockStatus};
use crate::validation::{validate_search_query, ValidationResult};
use crate::ALL_CATEGORIES;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<StockItem>,
}

impl Catalog {
    pub fn new(items: Vec<StockItem>) -> Self {
        Catalog { items }
    }

    pub fn items(&self) -> &[StockItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&StockItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// The `"All Categories"` sentinel followed by each distinct category in
    /// first-seen order. Items without a category contribute nothing.
    pub fn categories(&self) -> Vec<String> {
        let mut out = vec![ALL_CATEGORIES.to_string()];
        for category in self.items.iter().filter_map(|i| i.category.as_deref()) {
            if !out.iter().any(|c| c == category) {
                out.push(category.to_string());
            }
        }
        out
    }

    /// Items whose name contains `search` (case-insensitive) and whose
    /// category equals `category`, unless `category` is the sentinel.
    ///
    /// ## Errors
    /// `TooLong` when the trimmed search exceeds 100 characters.
    pub fn filter(&self, search: &str, category: &str) -> ValidationResult<Vec<&StockItem>> {
        let needle = validate_search_query(search)?.to_lowercase();
        let any_category = category.is_empty() || category == ALL_CATEGORIES;

        Ok(self
            .items
            .iter()
            .filter(|i| needle.is_empty() || i.product_name.to_lowercase().contains(&needle))
            .filter(|i| any_category || i.category.as_deref() == Some(category))
            .collect())
    }

    pub fn low_stock_items(&self) -> Vec<&StockItem> {
        self.items
            .iter()
            .filter(|i| i.status() == StockStatus::LowStock)
            .collect()
    }

    pub fn has_low_stock(&self) -> bool {
        self.items.iter().any(|i| i.status() == StockStatus::LowStock)
    }
}

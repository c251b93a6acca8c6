//! # Validation Module
//!
//! Input validation for inventory, customer registration and configuration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation layer                                           │
//! │  └── Required-field checks, immediate feedback                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: lustre-pos operations                                        │
//! │  └── THIS MODULE: business rules, no store interaction                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  └── UNIQUE (vendor_id, phone)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lustre_core::validation::{validate_phone, validate_product_name};
//!
//! assert!(validate_product_name("Matte Lipstick - Ruby").is_ok());
//! assert_eq!(validate_phone(" 077 123 4567 ").unwrap(), "0771234567");
//! ```

use crate::error::ValidationError;
use crate::types::{NewStockItem, StockItemUpdate};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product or customer name.
pub const MAX_NAME_LEN: usize = 200;

/// Shortest phone number that can identify a customer.
pub const MIN_PHONE_LEN: usize = 5;

/// Longest phone number (E.164 allows 15 digits).
pub const MAX_PHONE_LEN: usize = 15;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("product_name", name)
}

/// Validates a customer's display name. Same rules as product names.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Normalizes and validates a phone number.
///
/// Spaces and dashes are stripped; a single leading `+` is kept. What
/// remains must be 5-15 digits.
///
/// ## Returns
/// The normalized phone, which is what gets stored and looked up.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let normalized = normalize_phone(phone);

    if normalized.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if digits.len() < MIN_PHONE_LEN {
        return Err(ValidationError::TooShort {
            field: "phone".to_string(),
            min: MIN_PHONE_LEN,
        });
    }

    if digits.len() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    Ok(normalized)
}

/// Strips the separators operators commonly type into a phone field.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Longest product-grid search text.
pub const MAX_SEARCH_LEN: usize = 100;

/// Validates a catalog search query.
///
/// Empty is fine (no filtering). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price or cost in cents.
///
/// ## Rules
/// - Zero is allowed (free samples)
/// - Must not exceed MAX_PRICE_CENTS (1,000,000,000.00)
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an on-hand stock quantity. Zero is allowed.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the quantity of one cart line.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Operator Workflow
/// ```text
/// Stepper typed: 1000
///      │
///      ▼
/// validate_quantity(1000) ── qty > 999? ──► OutOfRange, line unchanged
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

pub fn validate_low_stock_threshold(threshold: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&threshold) {
        return Err(ValidationError::OutOfRange {
            field: "low_stock_threshold".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points: 0 to 10000 (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates the cash amount handed over at the till.
pub fn validate_tendered_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "tendered amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a stock item before it is inserted.
pub fn validate_new_stock_item(item: &NewStockItem) -> ValidationResult<()> {
    validate_product_name(&item.product_name)?;
    validate_stock_quantity(item.quantity)?;
    validate_price_cents("price", item.price_cents)?;
    if let Some(cost) = item.cost_cents {
        validate_price_cents("cost", cost)?;
    }
    validate_low_stock_threshold(item.low_stock_threshold)?;
    Ok(())
}

/// Validates the fields present in a partial update.
pub fn validate_stock_update(update: &StockItemUpdate) -> ValidationResult<()> {
    if update.is_empty() {
        return Err(ValidationError::Required {
            field: "update".to_string(),
        });
    }
    if let Some(name) = &update.product_name {
        validate_product_name(name)?;
    }
    if let Some(qty) = update.quantity {
        validate_stock_quantity(qty)?;
    }
    if let Some(price) = update.price_cents {
        validate_price_cents("price", price)?;
    }
    if let Some(cost) = update.cost_cents {
        validate_price_cents("cost", cost)?;
    }
    if let Some(threshold) = update.low_stock_threshold {
        validate_low_stock_threshold(threshold)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

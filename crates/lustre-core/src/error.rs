//! # Error Types
//!
//! Domain-specific error types for lustre-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lustre-core errors (this file)                                        │
//! │  ├── CoreError        - Cart and catalog rule violations               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lustre-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, stock conflicts                │
//! │                                                                         │
//! │  lustre-pos errors                                                     │
//! │  └── PosError         - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError ← DbError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors perform or imply a store interaction: a cart
//! rejection leaves the cart exactly as it was.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and catalog rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stock item id not present in the loaded catalog.
    #[error("Stock item not found: {0}")]
    StockItemNotFound(String),

    /// The cart has no line for this id.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Tried to add an item with zero quantity on hand.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Requested quantity is above the stock captured when the line was added.
    ///
    /// ## User Workflow
    /// ```text
    /// Line: Lipstick A (ceiling 3)
    ///      │
    ///      ▼
    /// set_quantity(5)
    ///      │
    ///      ▼
    /// QuantityExceedsStock { available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Lipstick A in stock", cart unchanged
    /// ```
    #[error("Only {available} of {name} in stock, requested {requested}")]
    QuantityExceedsStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A line total or cart total does not fit in `i64` cents.
    #[error("Amount is too large to price")]
    AmountOverflow,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g. a phone already registered with this vendor).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityExceedsStock {
            name: "Soap".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(err.to_string(), "Only 3 of Soap in stock, requested 5");

        let err = CoreError::OutOfStock {
            name: "Kajal".to_string(),
        };
        assert_eq!(err.to_string(), "Kajal is out of stock");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "phone".to_string(),
        };
        assert_eq!(validation_err.to_string(), "phone is required");

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

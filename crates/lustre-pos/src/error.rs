//! # Session Error Type
//!
//! Unified error type for everything the presentation layer calls.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Lustre POS                             │
//! │                                                                         │
//! │  lustre-core                 lustre-db                                  │
//! │  ───────────                 ─────────                                  │
//! │  CoreError::Validation ──┐   DbError::StockConflict ──┐                 │
//! │  CoreError::* (cart) ────┤   DbError::NotFound ───────┤                 │
//! │                          │   DbError::UniqueViolation ┤                 │
//! │                          │   DbError::* (store) ──────┤ error! logged   │
//! │                          ▼                            ▼                 │
//! │                  ┌───────────────────────────────────────┐              │
//! │                  │               PosError                │              │
//! │                  │  + session errors: EmptyCart,         │              │
//! │                  │    CheckoutInProgress, InvalidState   │              │
//! │                  └───────────────────┬───────────────────┘              │
//! │                                      │ ErrorPayload::from(&err)         │
//! │                                      ▼                                  │
//! │                  { "code": "INSUFFICIENT_STOCK", "message": "..." }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error leaves the cart as it was; only a committed sale clears it.

use serde::Serialize;
use thiserror::Error;
use tracing::error;
use ts_rs::TS;

use crate::checkout::CheckoutState;
use lustre_core::{CoreError, ValidationError};
use lustre_db::DbError;

/// Errors surfaced by the session layer.
#[derive(Debug, Error)]
pub enum PosError {
    /// Checkout attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line exceeded the live stock quantity at finalize time.
    #[error("Insufficient stock for {stock_id}: {available} available, {requested} requested")]
    InsufficientStock {
        stock_id: String,
        available: i64,
        requested: i64,
    },

    /// The sale could not be written. Nothing was persisted.
    #[error("Could not save: {0}")]
    Persistence(String),

    /// The catalog or another read could not be served.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A finalize is already running for this session.
    #[error("A checkout is already being finalized")]
    CheckoutInProgress,

    #[error("Cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: CheckoutState,
    },

    /// Cart rule rejected the edit; the cart is unchanged.
    #[error(transparent)]
    Cart(CoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for session operations.
pub type PosResult<T> = Result<T, PosError>;

/// Machine-readable error codes.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'INSUFFICIENT_STOCK':
///     reloadCatalog();
///     break;
///   case 'CHECKOUT_IN_PROGRESS':
///     break; // button is already disabled
///   default:
///     showError(e.message);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    EmptyCart,
    InsufficientStock,
    PersistenceError,
    DataUnavailable,
    CheckoutInProgress,
    InvalidState,
    CartError,
    ValidationError,
    NotFound,
    Duplicate,
    ConfigError,
}

impl PosError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PosError::EmptyCart => ErrorCode::EmptyCart,
            PosError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            PosError::Persistence(_) => ErrorCode::PersistenceError,
            PosError::DataUnavailable(_) => ErrorCode::DataUnavailable,
            PosError::CheckoutInProgress => ErrorCode::CheckoutInProgress,
            PosError::InvalidState { .. } => ErrorCode::InvalidState,
            PosError::Cart(_) => ErrorCode::CartError,
            PosError::Validation(_) => ErrorCode::ValidationError,
            PosError::NotFound { .. } => ErrorCode::NotFound,
            PosError::Duplicate { .. } => ErrorCode::Duplicate,
            PosError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Maps a failed read to `DataUnavailable` rather than `Persistence`.
    pub fn unavailable(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PosError::NotFound { entity, id },
            other => {
                error!(error = %other, "Store read failed");
                PosError::DataUnavailable(other.to_string())
            }
        }
    }
}

// =============================================================================
// Presentation Payload
// =============================================================================

/// What the presentation layer receives when an operation fails:
/// ```json
/// { "code": "EMPTY_CART", "message": "Cart is empty" }
/// ```
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&PosError> for ErrorPayload {
    fn from(err: &PosError) -> Self {
        ErrorPayload {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for PosError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => PosError::Validation(e),
            other => PosError::Cart(other),
        }
    }
}

/// Converts store errors raised by writes.
impl From<DbError> for PosError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::StockConflict {
                stock_id,
                available,
                requested,
            } => PosError::InsufficientStock {
                stock_id,
                available,
                requested,
            },
            DbError::NotFound { entity, id } => PosError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => PosError::Duplicate { field, value },
            other => {
                // Log the store detail; the message stays generic enough to show
                error!(error = %other, "Store write failed");
                PosError::Persistence(other.to_string())
            }
        }
    }
}

impl From<std::io::Error> for PosError {
    fn from(err: std::io::Error) -> Self {
        PosError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for PosError {
    fn from(err: toml::de::Error) -> Self {
        PosError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PosError {
    fn from(err: toml::ser::Error) -> Self {
        PosError::Config(err.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_conflict_becomes_insufficient_stock() {
        let err = PosError::from(DbError::StockConflict {
            stock_id: "soap".into(),
            available: 3,
            requested: 5,
        });
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert!(err.to_string().contains("3 available"));
    }

    #[test]
    fn test_core_validation_is_not_a_cart_error() {
        let err = PosError::from(CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        }));
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = PosError::from(CoreError::CartTooLarge { max: 100 });
        assert_eq!(err.code(), ErrorCode::CartError);
    }

    #[test]
    fn test_store_failures() {
        let write = PosError::from(DbError::ConnectionFailed("closed".into()));
        assert_eq!(write.code(), ErrorCode::PersistenceError);

        let read = PosError::unavailable(DbError::QueryFailed("boom".into()));
        assert_eq!(read.code(), ErrorCode::DataUnavailable);
    }

    #[test]
    fn test_payload_serialization() {
        let payload = ErrorPayload::from(&PosError::CheckoutInProgress);
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"code":"CHECKOUT_IN_PROGRESS","message":"A checkout is already being finalized"}"#
        );
    }
}

//! # lustre-pos: Checkout Session Layer
//!
//! What the presentation layer calls. Each operator session owns one
//! [`CheckoutCoordinator`]; everything else here is a thin adapter between
//! the pure rules in `lustre-core` and the store in `lustre-db`.
//!
//! ## Module Organization
//! ```text
//! lustre_pos/
//! ├── lib.rs          ◄─── You are here (logging, store connection)
//! ├── config.rs       ◄─── PosConfig: pos.toml + LUSTRE_* overrides
//! ├── error.rs        ◄─── PosError + ErrorCode for the presentation layer
//! ├── catalog.rs      ◄─── Loads a vendor's catalog
//! ├── lookup.rs       ◄─── Phone lookup and self-registration
//! ├── inventory.rs    ◄─── Stock item add/update/delete
//! ├── receipt.rs      ◄─── Receipt document + plain-text rendering
//! └── checkout.rs     ◄─── CheckoutCoordinator state machine
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()            RUST_LOG or "info,lustre=debug,sqlx=warn" │
//! │  2. PosConfig::load(None)     defaults ─► pos.toml ─► LUSTRE_* env      │
//! │  3. connect(&config)          SQLite pool, WAL, migrations              │
//! │  4. catalog::load()           product grid for the vendor               │
//! │  5. CheckoutCoordinator::new  one per operator session                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod inventory;
pub mod lookup;
pub mod receipt;

pub use checkout::{CheckoutCoordinator, CheckoutState, SaleOutcome, SessionSnapshot};
pub use config::PosConfig;
pub use error::{ErrorCode, ErrorPayload, PosError, PosResult};
pub use inventory::InventoryManager;
pub use lookup::CustomerLookup;
pub use receipt::{Receipt, ReceiptLine, ReceiptSettings};

use lustre_db::Database;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,lustre=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=lustre_pos=trace` - Trace the session layer only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Calling it twice is harmless; the second call keeps the first subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed");
    }
}

/// Opens the vendor's store as configured: creates the file if missing and
/// applies pending migrations.
pub async fn connect(config: &PosConfig) -> PosResult<Database> {
    let db_config = config.db_config()?;
    info!(path = ?db_config.database_path, "Connecting to store");

    Database::new(db_config)
        .await
        .map_err(|e| PosError::DataUnavailable(e.to_string()))
}

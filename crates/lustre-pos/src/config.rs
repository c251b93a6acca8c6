//! # POS Configuration
//!
//! Per-terminal settings: which vendor it sells for, pricing, currency
//! display, customer lookup limits and where the store file lives.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌──────────────┐   ┌───────────────────────┐   ┌──────────────────┐   ┌──────────┐
//! │   Defaults   │──►│ pos.toml (config dir  │──►│ LUSTRE_* env     │──►│ validate │
//! │ (this file)  │   │ or explicit path)     │   │ variables        │   │          │
//! └──────────────┘   └───────────────────────┘   └──────────────────┘   └──────────┘
//! ```
//!
//! ## Example pos.toml
//! ```toml
//! [vendor]
//! id = "shop-42"
//! store_name = "Lustre Beauty Colombo"
//!
//! [pricing]
//! tax_rate_bps = 1500
//! point_value_cents = 20000
//!
//! [currency]
//! code = "LKR"
//! symbol = "Rs"
//! decimals = 2
//!
//! [lookup]
//! history_limit = 10
//! min_phone_length = 5
//!
//! [database]
//! path = "/var/lib/lustre/lustre.db"
//! ```

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PosError, PosResult};
use crate::receipt::ReceiptSettings;
use lustre_core::validation::validate_tax_rate_bps;
use lustre_core::{Money, PricingEngine, TaxRate};
use lustre_db::DbConfig;

// =============================================================================
// Vendor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Tenant identifier supplied by the identity provider.
    pub id: String,

    /// Printed at the top of receipts.
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

fn default_store_name() -> String {
    "Lustre Beauty".to_string()
}

impl Default for VendorConfig {
    fn default() -> Self {
        VendorConfig {
            id: "default-vendor".to_string(),
            store_name: default_store_name(),
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Sales tax in basis points. 1500 = 15%.
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,

    /// Purchase amount that earns one loyalty point. 20000 = 200.00.
    #[serde(default = "default_point_value_cents")]
    pub point_value_cents: i64,
}

fn default_tax_rate_bps() -> u32 {
    1500
}

fn default_point_value_cents() -> i64 {
    20_000
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            tax_rate_bps: default_tax_rate_bps(),
            point_value_cents: default_point_value_cents(),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub code: String,

    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    #[serde(default = "default_currency_decimals")]
    pub decimals: u8,
}

fn default_currency_code() -> String {
    "LKR".to_string()
}

fn default_currency_symbol() -> String {
    "Rs".to_string()
}

fn default_currency_decimals() -> u8 {
    2
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
            decimals: default_currency_decimals(),
        }
    }
}

// =============================================================================
// Customer Lookup
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// How many past purchases a lookup returns.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Shorter phone input does not trigger a lookup.
    #[serde(default = "default_min_phone_length")]
    pub min_phone_length: usize,
}

fn default_history_limit() -> u32 {
    10
}

fn default_min_phone_length() -> usize {
    lustre_core::validation::MIN_PHONE_LEN
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            history_limit: default_history_limit(),
            min_phone_length: default_min_phone_length(),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store file. Unset means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Root Config
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub vendor: VendorConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> PosResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading POS config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load POS config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file, creating the parent directory.
    pub fn save(&self, config_path: Option<PathBuf>) -> PosResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| PosError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "POS config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PosResult<()> {
        if self.vendor.id.trim().is_empty() {
            return Err(PosError::Config("vendor.id must not be empty".into()));
        }

        validate_tax_rate_bps(self.pricing.tax_rate_bps)?;

        if self.pricing.point_value_cents <= 0 {
            return Err(PosError::Config(
                "pricing.point_value_cents must be greater than 0".into(),
            ));
        }

        if self.currency.decimals > 4 {
            return Err(PosError::Config("currency.decimals must be at most 4".into()));
        }

        if self.lookup.history_limit == 0 || self.lookup.history_limit > 100 {
            return Err(PosError::Config(
                "lookup.history_limit must be between 1 and 100".into(),
            ));
        }

        if self.lookup.min_phone_length == 0 {
            return Err(PosError::Config(
                "lookup.min_phone_length must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `LUSTRE_*` environment variable overrides. Unparseable
    /// numbers are ignored with a warning.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("LUSTRE_VENDOR_ID") {
            debug!(vendor_id = %id, "Overriding vendor ID from environment");
            self.vendor.id = id;
        }

        if let Ok(name) = std::env::var("LUSTRE_STORE_NAME") {
            self.vendor.store_name = name;
        }

        // Basis points, like the file
        if let Ok(rate) = std::env::var("LUSTRE_TAX_RATE") {
            match rate.parse::<u32>() {
                Ok(bps) => self.pricing.tax_rate_bps = bps,
                Err(_) => warn!(value = %rate, "Ignoring LUSTRE_TAX_RATE"),
            }
        }

        if let Ok(value) = std::env::var("LUSTRE_POINT_VALUE") {
            match value.parse::<i64>() {
                Ok(cents) => self.pricing.point_value_cents = cents,
                Err(_) => warn!(value = %value, "Ignoring LUSTRE_POINT_VALUE"),
            }
        }

        if let Ok(path) = std::env::var("LUSTRE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(limit) = std::env::var("LUSTRE_HISTORY_LIMIT") {
            match limit.parse::<u32>() {
                Ok(n) => self.lookup.history_limit = n,
                Err(_) => warn!(value = %limit, "Ignoring LUSTRE_HISTORY_LIMIT"),
            }
        }
    }

    /// `pos.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "lustre", "pos").map(|dirs| dirs.config_dir().join("pos.toml"))
    }

    /// Resolves the store file.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/com.lustre.pos/lustre.db`
    /// - **Windows**: `%APPDATA%\lustre\pos\data\lustre.db`
    /// - **Linux**: `~/.local/share/pos/lustre.db`
    pub fn database_path(&self) -> PosResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "lustre", "pos")
            .ok_or_else(|| PosError::Config("Could not determine app data directory".into()))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("lustre.db"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn vendor_id(&self) -> &str {
        &self.vendor.id
    }

    pub fn db_config(&self) -> PosResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?))
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.pricing.tax_rate_bps)
    }

    pub fn pricing_engine(&self) -> PricingEngine {
        PricingEngine::new(self.tax_rate())
    }

    pub fn point_value(&self) -> Money {
        Money::from_cents(self.pricing.point_value_cents)
    }

    pub fn receipt_settings(&self) -> ReceiptSettings {
        ReceiptSettings {
            store_name: self.vendor.store_name.clone(),
            currency_symbol: self.currency.symbol.clone(),
            decimals: self.currency.decimals,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

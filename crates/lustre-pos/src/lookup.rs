//! # Customer Lookup
//!
//! Resolves a typed phone number to a loyalty profile during checkout, and
//! registers new profiles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  phone typed ──► normalize ──► shorter than minimum? ──► None (no query)│
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                 customers.find_by_phone(vendor, phone)                  │
//! │                      │                       │                          │
//! │                  no profile               profile                       │
//! │                      │                       │                          │
//! │                      ▼                       ▼                          │
//! │                 None (guest)     balance = SUM(loyalty_points)          │
//! │                                  history = customer_sales, newest first │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                     Some(CustomerMatch)                 │
//! │                                                                         │
//! │  Store error anywhere ──► warn! ──► None (checkout continues as guest)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, instrument, warn};

use crate::config::LookupConfig;
use crate::error::PosResult;
use lustre_core::validation::{normalize_phone, validate_customer_name, validate_phone};
use lustre_core::{CustomerMatch, CustomerProfile};
use lustre_db::{Database, DbResult};

/// Phone lookup bound to one store.
#[derive(Debug, Clone)]
pub struct CustomerLookup {
    db: Database,
    history_limit: u32,
    min_phone_length: usize,
}

impl CustomerLookup {
    pub fn new(db: Database, settings: &LookupConfig) -> Self {
        CustomerLookup {
            db,
            history_limit: settings.history_limit,
            min_phone_length: settings.min_phone_length,
        }
    }

    /// Looks up the profile registered under `phone`.
    ///
    /// Never fails: short input, unknown phones and store errors all mean
    /// "no match".
    #[instrument(skip(self))]
    pub async fn lookup(&self, vendor_id: &str, phone: &str) -> Option<CustomerMatch> {
        let phone = normalize_phone(phone);
        if phone.chars().count() < self.min_phone_length {
            return None;
        }

        match self.try_lookup(vendor_id, &phone).await {
            Ok(found) => {
                debug!(matched = found.is_some(), "Customer lookup finished");
                found
            }
            Err(e) => {
                warn!(error = %e, "Customer lookup failed, continuing as guest");
                None
            }
        }
    }

    async fn try_lookup(&self, vendor_id: &str, phone: &str) -> DbResult<Option<CustomerMatch>> {
        let Some(profile) = self.db.customers().find_by_phone(vendor_id, phone).await? else {
            return Ok(None);
        };

        let points_balance = self.db.loyalty().balance(vendor_id, &profile.id).await?;
        let history = self
            .db
            .sales()
            .customer_history(vendor_id, &profile.phone, self.history_limit)
            .await?;

        Ok(Some(CustomerMatch {
            profile,
            points_balance,
            history,
        }))
    }

    /// Registers a loyalty profile.
    ///
    /// ## Errors
    /// - `Validation` for a blank or overlong name, or a malformed phone
    /// - `Duplicate` when the phone is already registered with this vendor
    #[instrument(skip(self, name))]
    pub async fn register(
        &self,
        vendor_id: &str,
        name: &str,
        phone: &str,
    ) -> PosResult<CustomerProfile> {
        validate_customer_name(name)?;
        let phone = validate_phone(phone)?;

        let profile = self.db.customers().insert(vendor_id, name, &phone).await?;
        debug!(customer_id = %profile.id, "Customer registered");
        Ok(profile)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

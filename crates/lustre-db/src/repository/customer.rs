//! # Customer Repository
//!
//! Loyalty profiles, one per (vendor, phone).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Register (self-service QR page or cashier)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert(vendor, name, phone) ── UNIQUE(vendor_id, phone) ──► duplicate │
//! │                                                                         │
//! │  Checkout: phone typed ──► find_by_phone() ──► profile or guest        │
//! │  Finalize: record_purchase() runs inside the checkout batch            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lustre_core::CustomerProfile;

const SELECT_CUSTOMER: &str = r#"
    SELECT id, vendor_id, name, phone, created_at, first_purchase_at, last_purchase_at
    FROM customers
"#;

/// Repository for customer profiles.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Exact match on the stored (normalized) phone.
    pub async fn find_by_phone(
        &self,
        vendor_id: &str,
        phone: &str,
    ) -> DbResult<Option<CustomerProfile>> {
        let profile = sqlx::query_as::<_, CustomerProfile>(&format!(
            "{SELECT_CUSTOMER} WHERE vendor_id = ?1 AND phone = ?2"
        ))
        .bind(vendor_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn get(&self, vendor_id: &str, id: &str) -> DbResult<Option<CustomerProfile>> {
        let profile = sqlx::query_as::<_, CustomerProfile>(&format!(
            "{SELECT_CUSTOMER} WHERE vendor_id = ?1 AND id = ?2"
        ))
        .bind(vendor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Creates a profile. A phone already registered with this vendor yields
    /// `DbError::UniqueViolation { field: "phone", .. }`.
    pub async fn insert(&self, vendor_id: &str, name: &str, phone: &str) -> DbResult<CustomerProfile> {
        let profile = CustomerProfile {
            id: Uuid::new_v4().to_string(),
            vendor_id: vendor_id.to_string(),
            name: name.trim().to_string(),
            phone: phone.to_string(),
            created_at: Utc::now(),
            first_purchase_at: None,
            last_purchase_at: None,
        };

        debug!(vendor_id = %vendor_id, id = %profile.id, "Registering customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, vendor_id, name, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.vendor_id)
        .bind(&profile.name)
        .bind(&profile.phone)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("phone", phone),
            other => other,
        })?;

        Ok(profile)
    }

    pub async fn list_for_vendor(&self, vendor_id: &str) -> DbResult<Vec<CustomerProfile>> {
        let profiles = sqlx::query_as::<_, CustomerProfile>(&format!(
            "{SELECT_CUSTOMER} WHERE vendor_id = ?1 ORDER BY name"
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

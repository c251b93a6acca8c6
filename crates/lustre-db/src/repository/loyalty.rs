//! # Loyalty Repository
//!
//! Read side of the `loyalty_points` ledger. Grants are only ever written by
//! the checkout batch, so the ledger and the sales ledger cannot disagree.
//!
//! ```text
//!   loyalty_points
//!   ┌──────────┬──────────┬───────────┬────────────────┐
//!   │ customer │ sale     │ reference │ points_earned  │
//!   ├──────────┼──────────┼───────────┼────────────────┤
//!   │ c1       │ s1       │ #M482913  │ 5              │
//!   │ c1       │ s7       │ #M483550  │ 2              │
//!   └──────────┴──────────┴───────────┴────────────────┘
//!   balance(c1) = SUM(points_earned) = 7
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;
use lustre_core::PointGrant;

#[derive(Debug, Clone)]
pub struct LoyaltyRepository {
    pool: SqlitePool,
}

impl LoyaltyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyRepository { pool }
    }

    /// Sum of all points granted to the customer. Zero when none.
    pub async fn balance(&self, vendor_id: &str, customer_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(points_earned) FROM loyalty_points WHERE vendor_id = ?1 AND customer_id = ?2",
        )
        .bind(vendor_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Ledger entries for the customer, newest first.
    pub async fn grants_for_customer(
        &self,
        vendor_id: &str,
        customer_id: &str,
    ) -> DbResult<Vec<PointGrant>> {
        let grants = sqlx::query_as::<_, PointGrant>(
            r#"
            SELECT id, vendor_id, customer_id, sale_id, reference,
                   points_earned, purchase_total_cents, created_at
            FROM loyalty_points
            WHERE vendor_id = ?1 AND customer_id = ?2
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(vendor_id)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_balance_without_grants_is_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.customers().insert("v1", "Nimali", "0771234567").await.unwrap();

        assert_eq!(db.loyalty().balance("v1", &customer.id).await.unwrap(), 0);
        assert!(db
            .loyalty()
            .grants_for_customer("v1", &customer.id)
            .await
            .unwrap()
            .is_empty());
    }
}

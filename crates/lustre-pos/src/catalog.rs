//! # Catalog Loading
//!
//! Fetches a vendor's stock once per screen load. The returned
//! [`Catalog`] is a snapshot: it is not refreshed after a sale, so the
//! quantities it shows can lag behind other terminals. Finalize re-checks
//! live stock regardless.

use tracing::{debug, instrument};

use crate::error::{PosError, PosResult};
use lustre_core::Catalog;
use lustre_db::Database;

/// Loads every stock item of the vendor.
///
/// ## Errors
/// `DataUnavailable` when the store cannot be read.
#[instrument(skip(db))]
pub async fn load(db: &Database, vendor_id: &str) -> PosResult<Catalog> {
    let items = db
        .stock()
        .list_for_vendor(vendor_id)
        .await
        .map_err(PosError::unavailable)?;

    debug!(count = items.len(), "Catalog loaded");
    Ok(Catalog::new(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use lustre_core::{NewStockItem, ALL_CATEGORIES};
    use lustre_db::DbConfig;

    fn item(name: &str, category: &str, quantity: i64) -> NewStockItem {
        NewStockItem {
            product_name: name.into(),
            quantity,
            cost_cents: None,
            price_cents: 50_000,
            category: Some(category.into()),
            low_stock_threshold: 5,
        }
    }

    #[tokio::test]
    async fn test_load_is_vendor_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.stock().insert("v1", &item("Lipstick A", "Lips", 10)).await.unwrap();
        db.stock().insert("v1", &item("Kajal", "Eyes", 2)).await.unwrap();
        db.stock().insert("v2", &item("Soap", "Bath", 3)).await.unwrap();

        let catalog = load(&db, "v1").await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.categories(), vec![ALL_CATEGORIES, "Lips", "Eyes"]);
        assert!(catalog.has_low_stock());
    }

    #[tokio::test]
    async fn test_store_failure_is_data_unavailable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        let err = load(&db, "v1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DataUnavailable);
    }
}

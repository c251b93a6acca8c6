//! # Inventory Management
//!
//! Vendor-side maintenance of stock items. Input is validated here, before
//! any store call; every operation is scoped to the vendor passed in.

use tracing::{info, instrument};

use crate::error::PosResult;
use lustre_core::validation::{validate_new_stock_item, validate_stock_update};
use lustre_core::{NewStockItem, StockItem, StockItemUpdate};
use lustre_db::Database;

#[derive(Debug, Clone)]
pub struct InventoryManager {
    db: Database,
}

impl InventoryManager {
    pub fn new(db: Database) -> Self {
        InventoryManager { db }
    }

    #[instrument(skip(self, item), fields(name = %item.product_name))]
    pub async fn add_stock_item(&self, vendor_id: &str, item: NewStockItem) -> PosResult<StockItem> {
        validate_new_stock_item(&item)?;

        let stored = self.db.stock().insert(vendor_id, &item).await?;
        info!(id = %stored.id, quantity = stored.quantity, "Stock item added");
        Ok(stored)
    }

    /// Applies the fields present in `update`. An empty update is rejected.
    #[instrument(skip(self, update))]
    pub async fn update_stock_item(
        &self,
        vendor_id: &str,
        id: &str,
        update: StockItemUpdate,
    ) -> PosResult<StockItem> {
        validate_stock_update(&update)?;

        let stored = self.db.stock().update(vendor_id, id, &update).await?;
        info!(quantity = stored.quantity, "Stock item updated");
        Ok(stored)
    }

    /// Removes the item for good. Sales that sold it keep their snapshots.
    #[instrument(skip(self))]
    pub async fn delete_stock_item(&self, vendor_id: &str, id: &str) -> PosResult<()> {
        self.db.stock().delete(vendor_id, id).await?;
        info!("Stock item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, PosError};
    use lustre_db::DbConfig;

    fn lipstick() -> NewStockItem {
        NewStockItem {
            product_name: "Lipstick A".into(),
            quantity: 10,
            cost_cents: Some(30_000),
            price_cents: 50_000,
            category: Some("Lips".into()),
            low_stock_threshold: 5,
        }
    }

    #[tokio::test]
    async fn test_add_update_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let inventory = InventoryManager::new(db.clone());

        let item = inventory.add_stock_item("v1", lipstick()).await.unwrap();
        assert_eq!(item.quantity, 10);

        let update = StockItemUpdate {
            quantity: Some(25),
            price_cents: Some(55_000),
            ..Default::default()
        };
        let item = inventory.update_stock_item("v1", &item.id, update).await.unwrap();
        assert_eq!(item.quantity, 25);
        assert_eq!(item.price_cents, 55_000);
        assert_eq!(item.product_name, "Lipstick A");

        inventory.delete_stock_item("v1", &item.id).await.unwrap();
        assert!(db.stock().get("v1", &item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_the_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let inventory = InventoryManager::new(db.clone());

        let mut bad = lipstick();
        bad.price_cents = -1;
        let err = inventory.add_stock_item("v1", bad).await.unwrap_err();
        assert!(matches!(err, PosError::Validation(_)));

        let mut bad = lipstick();
        bad.product_name = "x".repeat(201);
        assert!(inventory.add_stock_item("v1", bad).await.is_err());

        let err = inventory
            .update_stock_item("v1", "any", StockItemUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PosError::Validation(_)));

        assert_eq!(db.stock().count_for_vendor("v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_other_vendor_cannot_touch_item() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let inventory = InventoryManager::new(db);

        let item = inventory.add_stock_item("v1", lipstick()).await.unwrap();

        let err = inventory.delete_stock_item("v2", &item.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let update = StockItemUpdate {
            quantity: Some(0),
            ..Default::default()
        };
        let err = inventory.update_stock_item("v2", &item.id, update).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}

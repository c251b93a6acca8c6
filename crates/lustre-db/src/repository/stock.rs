//! # Stock Repository
//!
//! Tenant-scoped reads and writes of the `stock_items` collection.
//!
//! Every query carries `vendor_id`: an id belonging to another vendor behaves
//! exactly like an id that does not exist.
//!
//! Sale-time decrements do not live here. They run inside the checkout batch
//! in [`crate::repository::sale`], where they share a transaction with the
//! sale insert.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lustre_core::{NewStockItem, StockItem, StockItemUpdate};

const SELECT_STOCK: &str = r#"
    SELECT id, vendor_id, product_name, quantity, cost_cents, price_cents,
           category, low_stock_threshold, created_at, updated_at
    FROM stock_items
"#;

/// Repository for stock item operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// All stock items for a vendor, oldest first.
    ///
    /// This is the catalog load: one read per operator session.
    pub async fn list_for_vendor(&self, vendor_id: &str) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(&format!(
            "{SELECT_STOCK} WHERE vendor_id = ?1 ORDER BY created_at, rowid"
        ))
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(vendor_id = %vendor_id, count = items.len(), "Loaded stock items");
        Ok(items)
    }

    pub async fn get(&self, vendor_id: &str, id: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(&format!(
            "{SELECT_STOCK} WHERE vendor_id = ?1 AND id = ?2"
        ))
        .bind(vendor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Inserts a new stock item and returns it with generated id/timestamps.
    ///
    /// Input is expected to be validated by the caller.
    pub async fn insert(&self, vendor_id: &str, new: &NewStockItem) -> DbResult<StockItem> {
        let now = Utc::now();
        let item = StockItem {
            id: generate_stock_id(),
            vendor_id: vendor_id.to_string(),
            product_name: new.product_name.trim().to_string(),
            quantity: new.quantity,
            cost_cents: new.cost_cents,
            price_cents: new.price_cents,
            category: normalize_category(new.category.as_deref()),
            low_stock_threshold: new.low_stock_threshold,
            created_at: now,
            updated_at: now,
        };

        debug!(vendor_id = %vendor_id, id = %item.id, name = %item.product_name, "Inserting stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, vendor_id, product_name, quantity, cost_cents, price_cents,
                category, low_stock_threshold, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.vendor_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.cost_cents)
        .bind(item.price_cents)
        .bind(&item.category)
        .bind(item.low_stock_threshold)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Applies a partial update and returns the stored result.
    ///
    /// Absent fields keep their stored value (`COALESCE`). An empty category
    /// string clears the category.
    pub async fn update(
        &self,
        vendor_id: &str,
        id: &str,
        update: &StockItemUpdate,
    ) -> DbResult<StockItem> {
        debug!(vendor_id = %vendor_id, id = %id, "Updating stock item");

        let clear_category = matches!(update.category.as_deref(), Some(c) if c.trim().is_empty());
        let category = normalize_category(update.category.as_deref());

        let result = sqlx::query(
            r#"
            UPDATE stock_items SET
                product_name        = COALESCE(?3, product_name),
                quantity            = COALESCE(?4, quantity),
                cost_cents          = COALESCE(?5, cost_cents),
                price_cents         = COALESCE(?6, price_cents),
                category            = CASE WHEN ?7 THEN NULL ELSE COALESCE(?8, category) END,
                low_stock_threshold = COALESCE(?9, low_stock_threshold),
                updated_at          = ?10
            WHERE vendor_id = ?1 AND id = ?2
            "#,
        )
        .bind(vendor_id)
        .bind(id)
        .bind(update.product_name.as_deref().map(str::trim))
        .bind(update.quantity)
        .bind(update.cost_cents)
        .bind(update.price_cents)
        .bind(clear_category)
        .bind(&category)
        .bind(update.low_stock_threshold)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        self.get(vendor_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", id))
    }

    /// Hard-deletes a stock item. Past sales keep their line snapshots.
    pub async fn delete(&self, vendor_id: &str, id: &str) -> DbResult<()> {
        debug!(vendor_id = %vendor_id, id = %id, "Deleting stock item");

        let result = sqlx::query("DELETE FROM stock_items WHERE vendor_id = ?1 AND id = ?2")
            .bind(vendor_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        Ok(())
    }

    /// Current on-hand quantity, if the item exists.
    pub async fn quantity(&self, vendor_id: &str, id: &str) -> DbResult<Option<i64>> {
        let qty: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM stock_items WHERE vendor_id = ?1 AND id = ?2")
                .bind(vendor_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(qty)
    }

    pub async fn count_for_vendor(&self, vendor_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE vendor_id = ?1")
            .bind(vendor_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

pub fn generate_stock_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Sale Repository
//!
//! The sales ledger and the atomic checkout batch.
//!
//! ## Checkout Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  record_checkout() - ONE TRANSACTION                    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   │                                                                     │
//! │   ├── for each line:                                                    │
//! │   │     UPDATE stock_items SET quantity = quantity - q                  │
//! │   │     WHERE vendor_id = ? AND id = ? AND quantity >= q                │
//! │   │     0 rows? ──► ROLLBACK, StockConflict (nothing written)           │
//! │   │                                                                     │
//! │   ├── INSERT INTO sales            (primary ledger)                     │
//! │   ├── INSERT INTO customer_sales   (named customer with a phone only)   │
//! │   ├── UPDATE customers             (first/last purchase, if linked)     │
//! │   └── INSERT INTO loyalty_points   (if linked and points > 0)           │
//! │   │                                                                     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: SQLite rolls back and   │
//! │  no collection is touched.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional decrement re-validates against the live row, so two
//! terminals selling the last unit cannot both succeed.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lustre_core::{PaymentMethod, PointGrant, Sale};

// =============================================================================
// Batch Types
// =============================================================================

/// Everything one finalize writes.
#[derive(Debug, Clone)]
pub struct CheckoutBatch {
    /// Fully built sale document: lines, totals, reference, customer fields.
    pub sale: Sale,
    /// Present when the sale is linked to a known loyalty profile.
    pub loyalty: Option<LoyaltyCredit>,
}

/// Loyalty side effects for a linked customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyCredit {
    pub customer_id: String,
    /// Points to grant. Zero still updates the purchase timestamps.
    pub points: i64,
}

/// What a committed batch wrote.
#[derive(Debug, Clone)]
pub struct CheckoutRecord {
    pub sale: Sale,
    pub grant: Option<PointGrant>,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Row shape of `sales` / `customer_sales`; `lines` is a JSON array.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    vendor_id: String,
    reference: String,
    lines: String,
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    customer_name: String,
    customer_phone: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleRow> for Sale {
    type Error = DbError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            lines: serde_json::from_str(&row.lines)?,
            id: row.id,
            vendor_id: row.vendor_id,
            reference: row.reference,
            subtotal_cents: row.subtotal_cents,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            payment_method: row.payment_method,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            created_at: row.created_at,
        })
    }
}

const SALE_COLUMNS: &str = "id, vendor_id, reference, lines, subtotal_cents, tax_cents, \
     total_cents, payment_method, customer_name, customer_phone, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for the sales ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a checkout batch atomically. See the module docs for the steps.
    ///
    /// ## Errors
    /// - `StockConflict` when a line exceeds the live quantity
    /// - `NotFound` when a line's stock item or the linked customer is gone
    /// - anything the store raises; in every case nothing is written
    pub async fn record_checkout(&self, batch: CheckoutBatch) -> DbResult<CheckoutRecord> {
        let CheckoutBatch { sale, loyalty } = batch;
        let lines_json = serde_json::to_string(&sale.lines)?;

        debug!(
            vendor_id = %sale.vendor_id,
            reference = %sale.reference,
            lines = sale.lines.len(),
            total_cents = sale.total_cents,
            "Recording checkout batch"
        );

        let mut tx = self.pool.begin().await?;

        // 1. Conditional decrements against the live rows
        for line in &sale.lines {
            let result = sqlx::query(
                r#"
                UPDATE stock_items
                SET quantity = quantity - ?1, updated_at = ?2
                WHERE vendor_id = ?3 AND id = ?4 AND quantity >= ?1
                "#,
            )
            .bind(line.quantity)
            .bind(sale.created_at)
            .bind(&sale.vendor_id)
            .bind(&line.stock_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT quantity FROM stock_items WHERE vendor_id = ?1 AND id = ?2",
                )
                .bind(&sale.vendor_id)
                .bind(&line.stock_id)
                .fetch_optional(&mut *tx)
                .await?;

                tx.rollback().await?;

                warn!(
                    stock_id = %line.stock_id,
                    requested = line.quantity,
                    available = ?available,
                    "Checkout batch rolled back: stock conflict"
                );

                return Err(match available {
                    Some(available) => DbError::StockConflict {
                        stock_id: line.stock_id.clone(),
                        available,
                        requested: line.quantity,
                    },
                    None => DbError::not_found("Stock item", &line.stock_id),
                });
            }
        }

        // 2. Sale documents
        insert_document(&mut *tx, "sales", &sale, &lines_json).await?;
        if sale.is_attributed() {
            insert_document(&mut *tx, "customer_sales", &sale, &lines_json).await?;
        }

        // 3. Loyalty
        let mut grant = None;
        if let Some(credit) = loyalty {
            let result = sqlx::query(
                r#"
                UPDATE customers
                SET first_purchase_at = COALESCE(first_purchase_at, ?1),
                    last_purchase_at  = ?1
                WHERE vendor_id = ?2 AND id = ?3
                "#,
            )
            .bind(sale.created_at)
            .bind(&sale.vendor_id)
            .bind(&credit.customer_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping `tx` rolls back the decrements and sale inserts
                return Err(DbError::not_found("Customer", &credit.customer_id));
            }

            if credit.points > 0 {
                let entry = PointGrant {
                    id: Uuid::new_v4().to_string(),
                    vendor_id: sale.vendor_id.clone(),
                    customer_id: credit.customer_id.clone(),
                    sale_id: sale.id.clone(),
                    reference: sale.reference.clone(),
                    points_earned: credit.points,
                    purchase_total_cents: sale.total_cents,
                    created_at: sale.created_at,
                };

                sqlx::query(
                    r#"
                    INSERT INTO loyalty_points (
                        id, vendor_id, customer_id, sale_id, reference,
                        points_earned, purchase_total_cents, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .bind(&entry.id)
                .bind(&entry.vendor_id)
                .bind(&entry.customer_id)
                .bind(&entry.sale_id)
                .bind(&entry.reference)
                .bind(entry.points_earned)
                .bind(entry.purchase_total_cents)
                .bind(entry.created_at)
                .execute(&mut *tx)
                .await?;

                grant = Some(entry);
            }
        }

        tx.commit().await?;

        info!(
            vendor_id = %sale.vendor_id,
            reference = %sale.reference,
            total_cents = sale.total_cents,
            points = grant.as_ref().map(|g| g.points_earned).unwrap_or(0),
            "Checkout batch committed"
        );

        Ok(CheckoutRecord { sale, grant })
    }

    pub async fn get(&self, vendor_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE vendor_id = ?1 AND id = ?2"
        ))
        .bind(vendor_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Sale::try_from).transpose()
    }

    /// Most recent sales for the vendor, newest first.
    pub async fn list_recent(&self, vendor_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE vendor_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(vendor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    /// A customer's attributed purchases from `customer_sales`, newest first.
    pub async fn customer_history(
        &self,
        vendor_id: &str,
        phone: &str,
        limit: u32,
    ) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM customer_sales \
             WHERE vendor_id = ?1 AND customer_phone = ?2 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?3"
        ))
        .bind(vendor_id)
        .bind(phone)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Sale::try_from).collect()
    }

    pub async fn count_for_vendor(&self, vendor_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE vendor_id = ?1")
            .bind(vendor_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts one sale document into `sales` or `customer_sales`.
async fn insert_document(
    conn: &mut SqliteConnection,
    table: &'static str,
    sale: &Sale,
    lines_json: &str,
) -> DbResult<()> {
    sqlx::query(&format!(
        "INSERT INTO {table} ({SALE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ))
    .bind(&sale.id)
    .bind(&sale.vendor_id)
    .bind(&sale.reference)
    .bind(lines_json)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use lustre_core::{NewStockItem, SaleLine, StockItem, GUEST_CUSTOMER_NAME};

    const VENDOR: &str = "vendor-1";

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn add_stock(db: &Database, name: &str, price_cents: i64, quantity: i64) -> StockItem {
        db.stock()
            .insert(
                VENDOR,
                &NewStockItem {
                    product_name: name.to_string(),
                    quantity,
                    cost_cents: None,
                    price_cents,
                    category: None,
                    low_stock_threshold: 5,
                },
            )
            .await
            .unwrap()
    }

    fn sale(lines: Vec<(&StockItem, i64)>, name: &str, phone: &str) -> Sale {
        let lines: Vec<SaleLine> = lines
            .into_iter()
            .map(|(item, qty)| SaleLine {
                stock_id: item.id.clone(),
                name: item.product_name.clone(),
                quantity: qty,
                unit_price_cents: item.price_cents,
                unit_cost_cents: item.cost_cents,
            })
            .collect();
        let subtotal: i64 = lines.iter().map(|l| l.line_total().cents()).sum();
        let tax = (subtotal * 1500 + 5000) / 10000;
        let now = Utc::now();
        Sale {
            id: generate_sale_id(),
            vendor_id: VENDOR.to_string(),
            reference: Sale::reference_for(now),
            lines,
            subtotal_cents: subtotal,
            tax_cents: tax,
            total_cents: subtotal + tax,
            payment_method: PaymentMethod::Cash,
            customer_name: name.to_string(),
            customer_phone: phone.to_string(),
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_guest_checkout_decrements_and_records() {
        let db = setup().await;
        let lipstick = add_stock(&db, "Lipstick A", 50_000, 10).await;
        let untouched = add_stock(&db, "Toner", 10_000, 4).await;

        let record = db
            .sales()
            .record_checkout(CheckoutBatch {
                sale: sale(vec![(&lipstick, 2)], GUEST_CUSTOMER_NAME, ""),
                loyalty: None,
            })
            .await
            .unwrap();

        assert_eq!(record.sale.total_cents, 115_000);
        assert!(record.grant.is_none());
        assert_eq!(db.stock().quantity(VENDOR, &lipstick.id).await.unwrap(), Some(8));
        assert_eq!(db.stock().quantity(VENDOR, &untouched.id).await.unwrap(), Some(4));

        let stored = db.sales().get(VENDOR, &record.sale.id).await.unwrap().unwrap();
        assert_eq!(stored, record.sale);

        // Guests never land in the per-customer collection
        let copies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(copies, 0);
    }

    #[tokio::test]
    async fn test_stock_conflict_writes_nothing() {
        let db = setup().await;
        let lipstick = add_stock(&db, "Lipstick A", 50_000, 10).await;
        let soap = add_stock(&db, "Soap", 20_000, 3).await;

        let err = db
            .sales()
            .record_checkout(CheckoutBatch {
                sale: sale(vec![(&lipstick, 2), (&soap, 5)], GUEST_CUSTOMER_NAME, ""),
                loyalty: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::StockConflict { available: 3, requested: 5, .. }
        ));
        // The lipstick decrement that ran first was rolled back
        assert_eq!(db.stock().quantity(VENDOR, &lipstick.id).await.unwrap(), Some(10));
        assert_eq!(db.stock().quantity(VENDOR, &soap.id).await.unwrap(), Some(3));
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_stock_item_is_not_found() {
        let db = setup().await;
        let gone = add_stock(&db, "Kajal", 15_000, 5).await;
        db.stock().delete(VENDOR, &gone.id).await.unwrap();

        let err = db
            .sales()
            .record_checkout(CheckoutBatch {
                sale: sale(vec![(&gone, 1)], GUEST_CUSTOMER_NAME, ""),
                loyalty: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_linked_customer_gets_grant_and_history() {
        let db = setup().await;
        let lipstick = add_stock(&db, "Lipstick A", 50_000, 10).await;
        let customer = db.customers().insert(VENDOR, "Nimali", "0771234567").await.unwrap();

        let record = db
            .sales()
            .record_checkout(CheckoutBatch {
                sale: sale(vec![(&lipstick, 2)], "Nimali", "0771234567"),
                loyalty: Some(LoyaltyCredit {
                    customer_id: customer.id.clone(),
                    points: 5,
                }),
            })
            .await
            .unwrap();

        let grant = record.grant.unwrap();
        assert_eq!(grant.points_earned, 5);
        assert_eq!(grant.purchase_total_cents, 115_000);
        assert_eq!(grant.reference, record.sale.reference);

        assert_eq!(db.loyalty().balance(VENDOR, &customer.id).await.unwrap(), 5);
        assert_eq!(
            db.loyalty().grants_for_customer(VENDOR, &customer.id).await.unwrap().len(),
            1
        );

        let history = db.sales().customer_history(VENDOR, "0771234567", 10).await.unwrap();
        assert_eq!(history, vec![record.sale.clone()]);

        let profile = db.customers().get(VENDOR, &customer.id).await.unwrap().unwrap();
        assert_eq!(profile.first_purchase_at, Some(record.sale.created_at));
        assert_eq!(profile.last_purchase_at, Some(record.sale.created_at));
    }

    #[tokio::test]
    async fn test_zero_points_still_updates_purchase_dates() {
        let db = setup().await;
        let sachet = add_stock(&db, "Sample Sachet", 5_000, 10).await;
        let customer = db.customers().insert(VENDOR, "Kasun", "0719876543").await.unwrap();

        let record = db
            .sales()
            .record_checkout(CheckoutBatch {
                sale: sale(vec![(&sachet, 1)], "Kasun", "0719876543"),
                loyalty: Some(LoyaltyCredit {
                    customer_id: customer.id.clone(),
                    points: 0,
                }),
            })
            .await
            .unwrap();

        assert!(record.grant.is_none());
        assert_eq!(db.loyalty().balance(VENDOR, &customer.id).await.unwrap(), 0);
        let profile = db.customers().get(VENDOR, &customer.id).await.unwrap().unwrap();
        assert!(profile.last_purchase_at.is_some());
    }

    #[tokio::test]
    async fn test_history_newest_first_and_limited() {
        let db = setup().await;
        let item = add_stock(&db, "Face Wash", 10_000, 50).await;

        let mut ids = Vec::new();
        for _ in 0..3 {
            let record = db
                .sales()
                .record_checkout(CheckoutBatch {
                    sale: sale(vec![(&item, 1)], "Nimali", "0771234567"),
                    loyalty: None,
                })
                .await
                .unwrap();
            ids.push(record.sale.id);
        }

        let history = db.sales().customer_history(VENDOR, "0771234567", 2).await.unwrap();
        let got: Vec<_> = history.iter().map(|s| s.id.clone()).collect();
        assert_eq!(got, vec![ids[2].clone(), ids[1].clone()]);

        assert_eq!(db.sales().list_recent(VENDOR, 10).await.unwrap().len(), 3);
    }
}

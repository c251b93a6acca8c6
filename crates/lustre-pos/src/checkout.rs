//! # Checkout Coordinator
//!
//! One coordinator per operator session. It owns the cart, the customer
//! fields of the payment modal and the checkout state, and turns a cart into
//! a committed sale.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            initiate_checkout()               finalize_sale()            │
//! │   ┌──────┐ ───────────────────► ┌─────────────────┐ ──────► ┌────────┐  │
//! │   │ Idle │                      │ AwaitingPayment │         │Finaliz-│  │
//! │   └──────┘ ◄─────────────────── └─────────────────┘         │  ing   │  │
//! │     ▲  ▲    cancel_checkout()                               └───┬────┘  │
//! │     │  │    or any cart edit                                    │       │
//! │     │  │                                                        │       │
//! │     │  └──────────────── store error (cart intact) ◄────────────┤       │
//! │     │                                                           │ ok    │
//! │     │   next cart edit  ┌───────────┐                           │       │
//! │     └────────────────── │ Completed │ ◄─────────────────────────┘       │
//! │                         └───────────┘  cart + customer cleared          │
//! │                                                                         │
//! │  While Finalizing every mutation fails with CheckoutInProgress, so a    │
//! │  double-clicked "Complete sale" cannot write two sales.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! Session state sits behind a `std::sync::Mutex` that is never held across
//! an `.await`. Store calls run between two short critical sections; the
//! `Finalizing` state, not the lock, is what keeps a second finalize out.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use ts_rs::TS;

use crate::config::PosConfig;
use crate::error::{PosError, PosResult};
use crate::lookup::CustomerLookup;
use crate::receipt::{Receipt, ReceiptSettings};
use lustre_core::validation::{normalize_phone, validate_tendered_cents};
use lustre_core::{
    points_for, Cart, CartLine, CustomerMatch, Money, PaymentMethod, PricingEngine, Sale,
    StockItem, Totals, GUEST_CUSTOMER_NAME,
};
use lustre_db::{generate_sale_id, CheckoutBatch, Database, LoyaltyCredit};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CheckoutState {
    /// Building the cart.
    #[default]
    Idle,
    /// Payment modal open; cart frozen until an edit or cancel.
    AwaitingPayment,
    /// Store transaction running.
    Finalizing,
    /// Last sale committed; the cart is empty.
    Completed,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckoutState::Idle => "idle",
            CheckoutState::AwaitingPayment => "awaiting payment",
            CheckoutState::Finalizing => "finalizing",
            CheckoutState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Mutable session data.
#[derive(Debug, Default)]
struct Session {
    state: CheckoutState,
    cart: Cart,
    customer_name: String,
    customer_phone: String,
    /// Profile found by the last lookup, if its phone is still the one typed.
    customer: Option<CustomerMatch>,
    payment_method: PaymentMethod,
    tendered: Option<Money>,
}

impl Session {
    /// Guards a mutation of the cart or the customer fields.
    fn begin_edit(&mut self) -> PosResult<()> {
        if self.state == CheckoutState::Finalizing {
            return Err(PosError::CheckoutInProgress);
        }
        Ok(())
    }

    /// A successful edit reopens the sale: the payment modal is dismissed
    /// and a completed sale gives way to a new one.
    fn edited(&mut self) {
        self.state = CheckoutState::Idle;
    }

    fn reset_after_sale(&mut self) {
        self.cart.clear();
        self.customer_name.clear();
        self.customer_phone.clear();
        self.customer = None;
        self.payment_method = PaymentMethod::default();
        self.tendered = None;
        self.state = CheckoutState::Completed;
    }

    /// Linked profile for a finalize: the lookup result, provided the phone
    /// on the sale is still the one it was found under.
    fn linked_customer(&self, phone: &str) -> Option<&CustomerMatch> {
        self.customer
            .as_ref()
            .filter(|m| !phone.is_empty() && m.profile.phone == phone)
    }
}

// =============================================================================
// Views & Outcomes
// =============================================================================

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionSnapshot {
    pub state: CheckoutState,
    pub lines: Vec<CartLine>,
    pub totals: Totals,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer: Option<CustomerMatch>,
    pub payment_method: PaymentMethod,
    pub tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
}

/// What a successful finalize returns.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleOutcome {
    pub sale: Sale,
    pub points_earned: i64,
    /// Balance after this sale; `None` for guest checkouts.
    pub points_balance: Option<i64>,
    pub change_cents: Option<i64>,
    pub receipt: Option<Receipt>,
}

/// Returns the session to `Idle` unless disarmed. Covers both a store error
/// and a finalize future dropped before the commit, when sqlx rolls the
/// transaction back.
struct FinalizeGuard<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            session.state = CheckoutState::Idle;
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Session-scoped checkout workflow for one vendor.
#[derive(Debug, Clone)]
pub struct CheckoutCoordinator {
    db: Database,
    vendor_id: String,
    pricing: PricingEngine,
    point_value: Money,
    lookup: CustomerLookup,
    receipt_settings: ReceiptSettings,
    session: Arc<Mutex<Session>>,
}

impl CheckoutCoordinator {
    pub fn new(db: Database, config: &PosConfig) -> Self {
        CheckoutCoordinator {
            lookup: CustomerLookup::new(db.clone(), &config.lookup),
            db,
            vendor_id: config.vendor_id().to_string(),
            pricing: config.pricing_engine(),
            point_value: config.point_value(),
            receipt_settings: config.receipt_settings(),
            session: Arc::new(Mutex::new(Session::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn vendor_id(&self) -> &str {
        &self.vendor_id
    }

    pub fn state(&self) -> CheckoutState {
        self.lock().state
    }

    pub fn cart(&self) -> Cart {
        self.lock().cart.clone()
    }

    /// Totals recomputed from the current cart.
    pub fn totals(&self) -> PosResult<Totals> {
        Ok(self.pricing.totals(&self.lock().cart)?)
    }

    pub fn snapshot(&self) -> PosResult<SessionSnapshot> {
        let session = self.lock();
        let totals = self.pricing.totals(&session.cart)?;

        Ok(SessionSnapshot {
            state: session.state,
            lines: session.cart.lines().to_vec(),
            totals,
            customer_name: session.customer_name.clone(),
            customer_phone: session.customer_phone.clone(),
            customer: session.customer.clone(),
            payment_method: session.payment_method,
            tendered_cents: session.tendered.map(|t| t.cents()),
            change_cents: session.tendered.map(|t| totals.change_due(t).cents()),
        })
    }

    // =========================================================================
    // Cart Edits
    // =========================================================================

    /// Adds one unit of `item`. `Ok(false)` when the product is already in
    /// the cart; the existing line is left alone.
    pub fn add_item(&self, item: &StockItem) -> PosResult<bool> {
        let mut session = self.lock();
        session.begin_edit()?;
        let added = session.cart.add_item(item)?;
        session.edited();
        debug!(stock_id = %item.id, added, "Cart add");
        Ok(added)
    }

    /// Sets a line's quantity; below 1 removes the line. Above the stock
    /// ceiling the cart is left unchanged.
    pub fn set_quantity(&self, stock_id: &str, quantity: i64) -> PosResult<()> {
        let mut session = self.lock();
        session.begin_edit()?;
        session.cart.set_quantity(stock_id, quantity)?;
        session.edited();
        Ok(())
    }

    pub fn remove_item(&self, stock_id: &str) -> PosResult<bool> {
        let mut session = self.lock();
        session.begin_edit()?;
        let removed = session.cart.remove_item(stock_id);
        session.edited();
        Ok(removed)
    }

    pub fn clear_cart(&self) -> PosResult<()> {
        let mut session = self.lock();
        session.begin_edit()?;
        session.cart.clear();
        session.edited();
        Ok(())
    }

    // =========================================================================
    // Payment Modal
    // =========================================================================

    /// Stores the typed name. Blank means guest.
    pub fn set_customer_name(&self, name: &str) -> PosResult<()> {
        let mut session = self.lock();
        session.begin_edit()?;
        session.customer_name = name.trim().to_string();
        Ok(())
    }

    /// Stores the typed phone and looks the customer up. A match fills in
    /// the name; no match (or a failed lookup) keeps whatever was typed.
    pub async fn set_customer_phone(&self, phone: &str) -> PosResult<Option<CustomerMatch>> {
        let phone = normalize_phone(phone);
        {
            let mut session = self.lock();
            session.begin_edit()?;
            session.customer_phone = phone.clone();
            session.customer = None;
        }

        let found = self.lookup.lookup(&self.vendor_id, &phone).await;

        let mut session = self.lock();
        // Another keystroke may have replaced the phone while we waited
        if session.customer_phone != phone || session.state == CheckoutState::Finalizing {
            return Ok(found);
        }
        if let Some(m) = &found {
            session.customer_name = m.profile.name.clone();
        }
        session.customer = found.clone();
        Ok(found)
    }

    pub fn set_payment_method(&self, method: PaymentMethod) -> PosResult<()> {
        let mut session = self.lock();
        session.begin_edit()?;
        session.payment_method = method;
        Ok(())
    }

    /// Cash handed over, for change calculation. `None` clears it.
    pub fn set_tendered(&self, tendered_cents: Option<i64>) -> PosResult<()> {
        if let Some(cents) = tendered_cents {
            validate_tendered_cents(cents)?;
        }
        let mut session = self.lock();
        session.begin_edit()?;
        session.tendered = tendered_cents.map(Money::from_cents);
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Opens the payment step and returns the totals to show.
    ///
    /// ## Errors
    /// - `EmptyCart`: nothing to sell, state unchanged
    /// - `CheckoutInProgress`: a finalize is running
    /// - `Cart`: the total cannot be represented, state unchanged
    pub fn initiate_checkout(&self) -> PosResult<Totals> {
        let mut session = self.lock();
        session.begin_edit()?;
        if session.cart.is_empty() {
            return Err(PosError::EmptyCart);
        }

        let totals = self.pricing.totals(&session.cart)?;
        session.state = CheckoutState::AwaitingPayment;
        debug!(total_cents = totals.total_cents, "Checkout initiated");
        Ok(totals)
    }

    /// Closes the payment step. No store interaction.
    pub fn cancel_checkout(&self) -> PosResult<()> {
        let mut session = self.lock();
        match session.state {
            CheckoutState::AwaitingPayment => {
                session.state = CheckoutState::Idle;
                Ok(())
            }
            CheckoutState::Finalizing => Err(PosError::CheckoutInProgress),
            state => Err(PosError::InvalidState {
                action: "cancel checkout",
                state,
            }),
        }
    }

    /// Commits the cart as a sale.
    ///
    /// ## Steps
    /// 1. Under the lock: check `AwaitingPayment`, build the sale from the
    ///    cart and customer fields, enter `Finalizing`.
    /// 2. Without the lock: run the checkout batch (stock decrements, sale,
    ///    customer copy, loyalty grant) as one transaction.
    /// 3. Under the lock: on success clear the session and enter
    ///    `Completed`; on failure return to `Idle` with everything intact.
    ///
    /// ## Errors
    /// - `CheckoutInProgress`: another finalize is running
    /// - `InvalidState`: payment step not open
    /// - `EmptyCart`: cart emptied since initiation
    /// - `InsufficientStock`: a line exceeds live stock; nothing written
    /// - `NotFound`: a sold item was deleted meanwhile; nothing written
    /// - `Persistence`: the store failed; nothing written
    #[instrument(skip(self), fields(vendor_id = %self.vendor_id))]
    pub async fn finalize_sale(&self, print_receipt: bool) -> PosResult<SaleOutcome> {
        let (batch, tendered, prior_balance) = {
            let mut session = self.lock();
            session.begin_edit()?;
            if session.cart.is_empty() {
                return Err(PosError::EmptyCart);
            }
            if session.state != CheckoutState::AwaitingPayment {
                return Err(PosError::InvalidState {
                    action: "finalize a sale",
                    state: session.state,
                });
            }

            let (batch, prior_balance) = self.build_batch(&session)?;
            session.state = CheckoutState::Finalizing;
            (batch, session.tendered, prior_balance)
        };

        let mut guard = FinalizeGuard {
            session: &self.session,
            armed: true,
        };

        let reference = batch.sale.reference.clone();
        let record = match self.db.sales().record_checkout(batch).await {
            Ok(record) => record,
            Err(e) => {
                warn!(reference = %reference, error = %e, "Finalize failed, cart kept");
                return Err(e.into());
            }
        };

        guard.armed = false;
        self.lock().reset_after_sale();

        let points_earned = record.grant.as_ref().map_or(0, |g| g.points_earned);
        let points_balance = prior_balance.map(|b| b + points_earned);
        let change = tendered.map(|t| t.saturating_sub(record.sale.total()));

        info!(
            reference = %record.sale.reference,
            total_cents = record.sale.total_cents,
            lines = record.sale.lines.len(),
            points_earned,
            "Sale completed"
        );

        let receipt = print_receipt.then(|| {
            let receipt = Receipt::from_sale(&record.sale, &self.receipt_settings)
                .with_points(points_earned);
            match tendered {
                Some(t) => receipt.with_tendered(t),
                None => receipt,
            }
        });

        Ok(SaleOutcome {
            sale: record.sale,
            points_earned,
            points_balance,
            change_cents: change.map(|c| c.cents()),
            receipt,
        })
    }

    /// Builds the batch for the current session, plus the linked customer's
    /// balance before this sale.
    fn build_batch(&self, session: &Session) -> PosResult<(CheckoutBatch, Option<i64>)> {
        let totals = self.pricing.totals(&session.cart)?;
        let now = Utc::now();

        let customer_name = match session.customer_name.trim() {
            "" => GUEST_CUSTOMER_NAME.to_string(),
            name => name.to_string(),
        };

        let sale = Sale {
            id: generate_sale_id(),
            vendor_id: self.vendor_id.clone(),
            reference: Sale::reference_for(now),
            lines: session.cart.to_sale_lines(),
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method: session.payment_method,
            customer_name,
            customer_phone: session.customer_phone.clone(),
            created_at: now,
        };

        let linked = session.linked_customer(&sale.customer_phone);
        let loyalty = linked.map(|m| LoyaltyCredit {
            customer_id: m.profile.id.clone(),
            points: points_for(sale.total(), self.point_value),
        });
        let prior_balance = linked.map(|m| m.points_balance);

        Ok((CheckoutBatch { sale, loyalty }, prior_balance))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::inventory::InventoryManager;
    use lustre_core::{CoreError, NewStockItem};
    use lustre_db::DbConfig;

    const VENDOR: &str = "v1";

    fn config() -> PosConfig {
        let mut config = PosConfig::default();
        config.vendor.id = VENDOR.into();
        config
    }

    async fn setup() -> (Database, CheckoutCoordinator) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = CheckoutCoordinator::new(db.clone(), &config());
        (db, coordinator)
    }

    async fn stock(db: &Database, name: &str, price_cents: i64, quantity: i64) -> StockItem {
        InventoryManager::new(db.clone())
            .add_stock_item(
                VENDOR,
                NewStockItem {
                    product_name: name.into(),
                    quantity,
                    cost_cents: Some(price_cents / 2),
                    price_cents,
                    category: Some("Lips".into()),
                    low_stock_threshold: 5,
                },
            )
            .await
            .unwrap()
    }

    async fn quantity(db: &Database, id: &str) -> i64 {
        db.stock().quantity(VENDOR, id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_guest_sale_end_to_end() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;
        let kajal = stock(&db, "Kajal", 30_000, 4).await;

        pos.add_item(&lipstick).unwrap();
        pos.set_quantity(&lipstick.id, 2).unwrap();

        let totals = pos.initiate_checkout().unwrap();
        assert_eq!(totals.subtotal_cents, 100_000);
        assert_eq!(totals.tax_cents, 15_000);
        assert_eq!(totals.total_cents, 115_000);
        assert_eq!(pos.state(), CheckoutState::AwaitingPayment);

        pos.set_tendered(Some(200_000)).unwrap();
        let outcome = pos.finalize_sale(true).await.unwrap();

        assert_eq!(outcome.sale.total_cents, 115_000);
        assert_eq!(outcome.sale.customer_name, "Guest");
        assert!(outcome.sale.reference.starts_with("#M"));
        assert_eq!(outcome.points_earned, 0);
        assert_eq!(outcome.points_balance, None);
        assert_eq!(outcome.change_cents, Some(85_000));
        assert!(outcome.receipt.is_some());

        assert_eq!(quantity(&db, &lipstick.id).await, 8);
        assert_eq!(quantity(&db, &kajal.id).await, 4);
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 1);

        assert_eq!(pos.state(), CheckoutState::Completed);
        assert!(pos.cart().is_empty());
        assert_eq!(pos.snapshot().unwrap().tendered_cents, None);
    }

    #[tokio::test]
    async fn test_known_customer_earns_points() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;
        pos.lookup
            .register(VENDOR, "Nimali", "0771234567")
            .await
            .unwrap();

        pos.add_item(&lipstick).unwrap();
        pos.set_quantity(&lipstick.id, 2).unwrap();
        pos.initiate_checkout().unwrap();

        let found = pos.set_customer_phone("077 123 4567").await.unwrap().unwrap();
        assert_eq!(found.points_balance, 0);
        assert_eq!(pos.snapshot().unwrap().customer_name, "Nimali");

        let outcome = pos.finalize_sale(false).await.unwrap();
        assert_eq!(outcome.points_earned, 5);
        assert_eq!(outcome.points_balance, Some(5));
        assert!(outcome.receipt.is_none());

        let grants = db
            .loyalty()
            .grants_for_customer(VENDOR, &found.profile.id)
            .await
            .unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].reference, outcome.sale.reference);

        let history = db
            .sales()
            .customer_history(VENDOR, "0771234567", 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);

        // Next lookup sees the balance and the purchase
        let again = pos.lookup.lookup(VENDOR, "0771234567").await.unwrap();
        assert_eq!(again.points_balance, 5);
        assert_eq!(again.history[0].id, outcome.sale.id);
    }

    #[tokio::test]
    async fn test_named_walk_in_is_copied_but_earns_nothing() {
        let (db, pos) = setup().await;
        let soap = stock(&db, "Herbal Soap", 20_000, 10).await;

        pos.add_item(&soap).unwrap();
        pos.initiate_checkout().unwrap();
        pos.set_customer_name("Kasun").unwrap();
        assert!(pos.set_customer_phone("0719876543").await.unwrap().is_none());

        let outcome = pos.finalize_sale(false).await.unwrap();
        assert_eq!(outcome.sale.customer_name, "Kasun");
        assert_eq!(outcome.points_earned, 0);
        assert_eq!(outcome.points_balance, None);
        assert_eq!(
            db.sales()
                .customer_history(VENDOR, "0719876543", 10)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let (db, pos) = setup().await;

        let err = pos.initiate_checkout().unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyCart);
        assert_eq!(pos.state(), CheckoutState::Idle);

        let err = pos.finalize_sale(false).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyCart);
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_finalize_requires_payment_step() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;

        pos.add_item(&lipstick).unwrap();
        let err = pos.finalize_sale(false).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);
        assert_eq!(quantity(&db, &lipstick.id).await, 10);
    }

    #[tokio::test]
    async fn test_insufficient_live_stock_rolls_back() {
        let (db, pos) = setup().await;
        let soap = stock(&db, "Herbal Soap", 20_000, 10).await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;

        pos.add_item(&lipstick).unwrap();
        pos.add_item(&soap).unwrap();
        pos.set_quantity(&soap.id, 5).unwrap();

        // Another terminal sold most of the soap meanwhile
        db.stock()
            .update(
                VENDOR,
                &soap.id,
                &lustre_core::StockItemUpdate {
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        pos.initiate_checkout().unwrap();
        let err = pos.finalize_sale(false).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::InsufficientStock { ref stock_id, available: 3, requested: 5 } if *stock_id == soap.id
        ));

        assert_eq!(quantity(&db, &soap.id).await, 3);
        assert_eq!(quantity(&db, &lipstick.id).await, 10);
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 0);

        // Cart intact, checkout can be retried after fixing the quantity
        assert_eq!(pos.state(), CheckoutState::Idle);
        assert_eq!(pos.cart().item_count(), 2);
        pos.set_quantity(&soap.id, 3).unwrap();
        pos.initiate_checkout().unwrap();
        pos.finalize_sale(false).await.unwrap();
        assert_eq!(quantity(&db, &soap.id).await, 0);
    }

    #[tokio::test]
    async fn test_cart_rejections_leave_cart_unchanged() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 3).await;
        let empty = stock(&db, "Nude Gloss", 40_000, 0).await;

        assert!(pos.add_item(&lipstick).unwrap());
        assert!(!pos.add_item(&lipstick).unwrap());
        assert_eq!(pos.cart().line(&lipstick.id).unwrap().quantity, 1);

        let err = pos.set_quantity(&lipstick.id, 4).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CartError);
        assert_eq!(pos.cart().line(&lipstick.id).unwrap().quantity, 1);

        assert!(pos.add_item(&empty).is_err());

        pos.set_quantity(&lipstick.id, 0).unwrap();
        assert!(pos.cart().is_empty());
    }

    #[tokio::test]
    async fn test_edit_or_cancel_reopens_the_sale() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;

        pos.add_item(&lipstick).unwrap();
        pos.initiate_checkout().unwrap();
        pos.cancel_checkout().unwrap();
        assert_eq!(pos.state(), CheckoutState::Idle);

        let err = pos.cancel_checkout().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);

        pos.initiate_checkout().unwrap();
        pos.set_quantity(&lipstick.id, 2).unwrap();
        assert_eq!(pos.state(), CheckoutState::Idle);

        pos.initiate_checkout().unwrap();
        pos.finalize_sale(false).await.unwrap();
        assert_eq!(pos.state(), CheckoutState::Completed);

        pos.add_item(&lipstick).unwrap();
        assert_eq!(pos.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_double_submit_writes_one_sale() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;

        pos.add_item(&lipstick).unwrap();
        pos.initiate_checkout().unwrap();

        let (first, second) = tokio::join!(pos.finalize_sale(false), pos.finalize_sale(false));

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(PosError::CheckoutInProgress) | Err(PosError::EmptyCart)
        )));

        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 1);
        assert_eq!(quantity(&db, &lipstick.id).await, 9);
    }

    #[tokio::test]
    async fn test_two_terminals_cannot_oversell() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let last = stock(&db, "Ruby Lipstick", 55_000, 1).await;

        let till_a = CheckoutCoordinator::new(db.clone(), &config());
        let till_b = CheckoutCoordinator::new(db.clone(), &config());

        for till in [&till_a, &till_b] {
            till.add_item(&last).unwrap();
            till.initiate_checkout().unwrap();
        }

        let (a, b) = tokio::join!(till_a.finalize_sale(false), till_b.finalize_sale(false));
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(PosError::InsufficientStock { available: 0, .. }))));

        assert_eq!(quantity(&db, &last.id).await, 0);
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_terminals_on_shared_store_file_cannot_oversell() {
        let dir = std::env::temp_dir().join(format!("lustre-pos-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let db = Database::new(DbConfig::new(dir.join("lustre.db")).max_connections(4))
            .await
            .unwrap();
        let last = stock(&db, "Ruby Lipstick", 55_000, 1).await;

        let tills: Vec<_> = (0..4)
            .map(|_| CheckoutCoordinator::new(db.clone(), &config()))
            .collect();
        for till in &tills {
            till.add_item(&last).unwrap();
            till.initiate_checkout().unwrap();
        }

        let (a, b, c, d) = tokio::join!(
            tills[0].finalize_sale(false),
            tills[1].finalize_sale(false),
            tills[2].finalize_sale(false),
            tills[3].finalize_sale(false),
        );
        let results = [a, b, c, d];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(PosError::InsufficientStock { available: 0, .. })))
                .count(),
            3
        );

        // Losing terminals keep their carts for another attempt
        for (till, result) in tills.iter().zip(&results) {
            if result.is_err() {
                assert_eq!(till.state(), CheckoutState::Idle);
                assert_eq!(till.cart().item_count(), 1);
            }
        }

        assert_eq!(quantity(&db, &last.id).await, 0);
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 1);

        db.close().await;
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unrepresentable_total_blocks_checkout() {
        let (db, pos) = setup().await;
        // A row that never went through inventory validation
        let mut gift = stock(&db, "Gift Set", 50_000, 5).await;
        gift.price_cents = i64::MAX / 2 + 1;

        pos.add_item(&gift).unwrap();
        pos.set_quantity(&gift.id, 2).unwrap();

        let err = pos.initiate_checkout().unwrap_err();
        assert!(matches!(err, PosError::Cart(CoreError::AmountOverflow)));
        assert_eq!(err.code(), ErrorCode::CartError);
        assert_eq!(pos.state(), CheckoutState::Idle);
        assert!(pos.totals().is_err());
        assert!(pos.snapshot().is_err());

        // Back to a priceable quantity
        pos.set_quantity(&gift.id, 1).unwrap();
        assert!(pos.initiate_checkout().is_ok());
        assert_eq!(db.sales().count_for_vendor(VENDOR).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_cart() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;

        pos.add_item(&lipstick).unwrap();
        pos.set_customer_name("Nimali").unwrap();
        pos.initiate_checkout().unwrap();
        db.close().await;

        let err = pos.finalize_sale(true).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::PersistenceError);

        assert_eq!(pos.state(), CheckoutState::Idle);
        assert_eq!(pos.cart().item_count(), 1);
        assert_eq!(pos.snapshot().unwrap().customer_name, "Nimali");
        assert!(pos.initiate_checkout().is_ok());
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_guest() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;
        pos.lookup
            .register(VENDOR, "Nimali", "0771234567")
            .await
            .unwrap();

        pos.add_item(&lipstick).unwrap();
        pos.initiate_checkout().unwrap();
        db.close().await;

        assert!(pos.set_customer_phone("0771234567").await.unwrap().is_none());
        assert!(pos.snapshot().unwrap().customer.is_none());
        assert_eq!(pos.state(), CheckoutState::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_changing_phone_unlinks_customer() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;
        let profile = pos
            .lookup
            .register(VENDOR, "Nimali", "0771234567")
            .await
            .unwrap();

        pos.add_item(&lipstick).unwrap();
        pos.set_quantity(&lipstick.id, 4).unwrap();
        pos.initiate_checkout().unwrap();
        pos.set_customer_phone("0771234567").await.unwrap();
        pos.set_customer_phone("0770000000").await.unwrap();

        let outcome = pos.finalize_sale(false).await.unwrap();
        assert_eq!(outcome.points_earned, 0);
        assert_eq!(db.loyalty().balance(VENDOR, &profile.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tendered_and_payment_method() {
        let (db, pos) = setup().await;
        let lipstick = stock(&db, "Lipstick A", 50_000, 10).await;

        assert!(pos.set_tendered(Some(-1)).is_err());

        pos.add_item(&lipstick).unwrap();
        pos.initiate_checkout().unwrap();
        pos.set_payment_method(PaymentMethod::Card).unwrap();
        pos.set_tendered(Some(50_000)).unwrap();
        assert_eq!(pos.snapshot().unwrap().change_cents, Some(0));

        let outcome = pos.finalize_sale(false).await.unwrap();
        assert_eq!(outcome.sale.payment_method, PaymentMethod::Card);
        assert_eq!(pos.snapshot().unwrap().payment_method, PaymentMethod::Cash);
    }
}

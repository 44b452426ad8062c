//! # Sale Commit Protocol
//!
//! Turns the session's cart into a persisted sale.
//!
//! ## Steps and Compensation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        commit(session, request)                         │
//! │                                                                         │
//! │  1. build_sale        EmptyCart / InvalidDiscount      (nothing written)│
//! │  2. check stock       ProductNotFound / InsufficientStock               │
//! │                                                         (nothing written)│
//! │  3. decrement A ✓                                                      │
//! │     decrement B ✓                                                      │
//! │     decrement C ✗ ──► restock B, restock A ──► error                   │
//! │  4. record sale ✗ ──► restock C, B, A      ──► CommitFailed            │
//! │  5. ledger: Recorded / Deferred / NotCash                               │
//! │  6. clear cart                                                         │
//! │                                                                         │
//! │  A restock that itself fails ──► CompensationFailed { unrestored }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checks in step 2 catch the common case without writing. The
//! conditional decrement in step 3 catches another till selling the same
//! units in between.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use till_core::sale::cancel;
use till_core::{
    build_sale, CashSaleOutcome, CheckoutRequest, CoreError, InventoryStore, Sale, SaleStore,
    StoreError,
};

use crate::error::{SessionError, SessionResult};
use crate::session::CashierSession;

/// What a successful commit produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub sale: Sale,
    pub cash: CashSaleOutcome,
}

/// Runs checkouts and cancellations against an inventory and a sale store.
///
/// ## Usage
/// ```rust,ignore
/// let committer = SaleCommitter::new(db.products(), db.sales());
///
/// let receipt = committer.commit(&mut session, &CheckoutRequest::new(PaymentMethod::Cash)).await?;
/// session.save_register(&db.state()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleCommitter<I, S> {
    inventory: I,
    sales: S,
}

impl<I, S> SaleCommitter<I, S>
where
    I: InventoryStore,
    S: SaleStore,
{
    pub fn new(inventory: I, sales: S) -> Self {
        SaleCommitter { inventory, sales }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub fn sales(&self) -> &S {
        &self.sales
    }

    /// Commits the session's cart as a sale.
    ///
    /// On success the cart is empty and, for cash, the ledger has a new
    /// movement or pending entry. On any error the cart, the ledger and
    /// every stock level are as they were.
    #[tracing::instrument(
        skip(self, session, request),
        fields(
            cashier = %session.cashier().id,
            lines = session.cart().item_count(),
            method = %request.payment_method
        )
    )]
    pub async fn commit(
        &self,
        session: &mut CashierSession,
        request: &CheckoutRequest,
    ) -> SessionResult<CommitReceipt> {
        let sale = build_sale(session.cart(), request, session.cashier(), Utc::now())?;

        self.check_stock(&sale).await?;

        let mut applied: Vec<(String, i64)> = Vec::with_capacity(sale.items.len());
        for item in &sale.items {
            match self
                .inventory
                .decrement_stock(&item.product_id, item.quantity)
                .await
            {
                Ok(remaining) => {
                    applied.push((item.product_id.clone(), item.quantity));
                    debug!(product_id = %item.product_id, remaining, "Stock decremented");
                }
                Err(err) => {
                    warn!(product_id = %item.product_id, error = %err, "Decrement rejected, compensating");
                    return Err(self.compensate(&applied, decrement_error(err)).await);
                }
            }
        }

        if let Err(err) = self.sales.record_sale(&sale).await {
            warn!(sale_id = %sale.id, error = %err, "Recording sale failed, compensating");
            let cause = SessionError::CommitFailed {
                cause: err.to_string(),
            };
            return Err(self.compensate(&applied, cause).await);
        }

        let cash = session.ledger_mut().record_sale(&sale, Utc::now());
        session.cart_mut().clear();

        match &cash {
            CashSaleOutcome::Deferred => {
                warn!(sale_id = %sale.id, total = %sale.total(), "Register closed, cash sale pending")
            }
            _ => info!(sale_id = %sale.id, total = %sale.total(), "Sale committed"),
        }

        Ok(CommitReceipt { sale, cash })
    }

    /// Reads every product and compares stock before anything is written.
    async fn check_stock(&self, sale: &Sale) -> SessionResult<()> {
        for item in &sale.items {
            let product = self
                .inventory
                .get_product(&item.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if product.stock < item.quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available: product.stock,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Restocks `applied` in reverse order and returns the error to report.
    ///
    /// If every restock succeeds, `cause` is returned as is. Otherwise the
    /// result is `CompensationFailed` naming the products left short.
    async fn compensate(&self, applied: &[(String, i64)], cause: SessionError) -> SessionError {
        let mut unrestored = Vec::new();

        for (product_id, quantity) in applied.iter().rev() {
            if let Err(err) = self.inventory.restock(product_id, *quantity).await {
                error!(product_id = %product_id, quantity, error = %err, "Compensating restock failed");
                unrestored.push(product_id.clone());
            }
        }

        if unrestored.is_empty() {
            info!(restored = applied.len(), "Stock decrements compensated");
            cause
        } else {
            SessionError::CompensationFailed {
                cause: cause.to_string(),
                unrestored,
            }
        }
    }

    /// Cancels a completed sale and returns its items to stock.
    ///
    /// ## Errors
    /// - `SaleNotFound` / `InvalidSaleStatus` - nothing changed
    /// - `RestockFailed` - the sale is cancelled but some items were not
    ///   returned; the listed products need a manual stock correction
    ///
    /// Cash is not refunded here. The cashier records the refund as a
    /// withdrawal.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_sale(&self, sale_id: &str) -> SessionResult<Sale> {
        let sale = self
            .sales
            .get_sale(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let now = Utc::now();
        cancel(&sale, now)?;

        let cancelled = self.sales.mark_cancelled(sale_id, now).await?;

        let mut unrestored = Vec::new();
        for item in &cancelled.items {
            if let Err(err) = self.inventory.restock(&item.product_id, item.quantity).await {
                error!(
                    sale_id = %sale_id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %err,
                    "Restock after cancellation failed"
                );
                unrestored.push(item.product_id.clone());
            }
        }

        if !unrestored.is_empty() {
            return Err(SessionError::RestockFailed {
                sale_id: sale_id.to_string(),
                unrestored,
            });
        }

        info!(sale_id = %sale_id, total = %cancelled.total(), "Sale cancelled");
        Ok(cancelled)
    }
}

/// Stock races keep their domain meaning; anything else is a failed commit.
fn decrement_error(err: StoreError) -> SessionError {
    match err {
        StoreError::InsufficientStock { .. } | StoreError::ProductNotFound(_) => err.into(),
        other => SessionError::CommitFailed {
            cause: other.to_string(),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryInventory, InMemorySaleStore};
    use async_trait::async_trait;
    use till_core::{
        Cashier, DiscountRate, Money, MovementKind, PaymentMethod, Product, SaleStatus, StoreResult,
    };

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Produto {}", id),
            description: None,
            sku: None,
            barcode: None,
            price_cents,
            stock,
            category: "Geral".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    struct Fixture {
        inventory: InMemoryInventory,
        sales: InMemorySaleStore,
        committer: SaleCommitter<InMemoryInventory, InMemorySaleStore>,
        session: CashierSession,
    }

    /// A: 10.00 × stock 5, B: 5.00 × stock 3, C: 1.00 × stock 10.
    /// Cart holds A×2, B×1.
    fn fixture() -> Fixture {
        let a = product("A", 1000, 5);
        let b = product("B", 500, 3);
        let c = product("C", 100, 10);
        let inventory = InMemoryInventory::with_products(vec![a.clone(), b.clone(), c]);
        let sales = InMemorySaleStore::new();
        let committer = SaleCommitter::new(inventory.clone(), sales.clone());

        let mut session = CashierSession::new(Cashier::new("u-1", "Ana"));
        session.add_product(&a).unwrap();
        session.add_product(&a).unwrap();
        session.add_product(&b).unwrap();

        Fixture {
            inventory,
            sales,
            committer,
            session,
        }
    }

    fn cash_with_ten_percent() -> CheckoutRequest {
        CheckoutRequest::new(PaymentMethod::Cash).with_discount(DiscountRate::from_bps(1000).unwrap())
    }

    #[tokio::test]
    async fn test_commit_cash_sale_with_open_register() {
        let mut f = fixture();
        f.session.open_register(Money::from_cents(10000)).unwrap();

        let receipt = f
            .committer
            .commit(&mut f.session, &cash_with_ten_percent())
            .await
            .unwrap();

        assert_eq!(receipt.sale.total_cents, 2250);
        assert_eq!(receipt.sale.status, SaleStatus::Completed);
        assert!(matches!(receipt.cash, CashSaleOutcome::Recorded { .. }));

        assert_eq!(f.inventory.stock("A").await, Some(3));
        assert_eq!(f.inventory.stock("B").await, Some(2));
        assert_eq!(f.inventory.stock("C").await, Some(10));
        assert_eq!(f.sales.sale_count().await, 1);

        assert!(f.session.cart().is_empty());
        assert_eq!(f.session.register_state().current_amount.cents(), 12250);
        let last = f.session.ledger().movements().last().unwrap();
        assert_eq!(
            last.kind,
            MovementKind::Sale {
                sale_id: receipt.sale.id.clone()
            }
        );
        f.session.ledger().verify().unwrap();
    }

    #[tokio::test]
    async fn test_cash_sale_with_closed_register_is_deferred() {
        let mut f = fixture();

        let receipt = f
            .committer
            .commit(&mut f.session, &CheckoutRequest::new(PaymentMethod::Cash))
            .await
            .unwrap();

        assert_eq!(receipt.cash, CashSaleOutcome::Deferred);
        assert_eq!(f.session.ledger().pending_cash_sales().len(), 1);
        assert!(f.session.ledger().movements().is_empty());

        f.session.open_register(Money::zero()).unwrap();
        assert_eq!(f.session.reconcile_pending().unwrap(), 1);
        assert_eq!(f.session.register_state().current_amount.cents(), 2500);
    }

    #[tokio::test]
    async fn test_card_sale_leaves_ledger_alone() {
        let mut f = fixture();
        f.session.open_register(Money::from_cents(1000)).unwrap();

        let receipt = f
            .committer
            .commit(&mut f.session, &CheckoutRequest::new(PaymentMethod::Card))
            .await
            .unwrap();

        assert_eq!(receipt.cash, CashSaleOutcome::NotCash);
        assert_eq!(f.session.ledger().movements().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let mut f = fixture();
        f.session.cart_mut().clear();

        let err = f
            .committer
            .commit(&mut f.session, &CheckoutRequest::new(PaymentMethod::Pix))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let mut f = fixture();
        f.inventory.set_stock("A", 1).await;

        let err = f
            .committer
            .commit(&mut f.session, &cash_with_ten_percent())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Core(CoreError::InsufficientStock {
                ref product_id,
                requested: 2,
                available: 1,
            }) if product_id == "A"
        ));
        assert_eq!(f.inventory.stock("A").await, Some(1));
        assert_eq!(f.inventory.stock("B").await, Some(3));
        assert_eq!(f.sales.sale_count().await, 0);
        assert_eq!(f.session.cart().total_quantity(), 3);
    }

    /// Another till sells `quantity` of `product_id` after the stock check
    /// and just before this commit decrements it.
    struct RacingInventory {
        inner: InMemoryInventory,
        product_id: String,
        quantity: i64,
    }

    #[async_trait]
    impl InventoryStore for RacingInventory {
        async fn list_products(&self) -> StoreResult<Vec<Product>> {
            self.inner.list_products().await
        }

        async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
            self.inner.get_product(id).await
        }

        async fn decrement_stock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
            if id == self.product_id {
                self.inner.decrement_stock(id, self.quantity).await?;
            }
            self.inner.decrement_stock(id, quantity).await
        }

        async fn restock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
            self.inner.restock(id, quantity).await
        }
    }

    #[tokio::test]
    async fn test_lost_race_on_decrement_restores_earlier_lines() {
        let mut f = fixture();
        let committer = SaleCommitter::new(
            RacingInventory {
                inner: f.inventory.clone(),
                product_id: "B".to_string(),
                quantity: 3,
            },
            f.sales.clone(),
        );

        let err = committer
            .commit(&mut f.session, &cash_with_ten_percent())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Core(CoreError::InsufficientStock {
                ref product_id,
                requested: 1,
                available: 0,
            }) if product_id == "B"
        ));
        assert_eq!(f.inventory.stock("A").await, Some(5));
        assert_eq!(f.inventory.stock("B").await, Some(0));
        assert_eq!(f.sales.sale_count().await, 0);
        assert_eq!(f.session.cart().total_quantity(), 3);
    }

    #[tokio::test]
    async fn test_failed_decrement_restores_earlier_lines() {
        let mut f = fixture();
        f.inventory.fail_decrement_for("B").await;

        let err = f
            .committer
            .commit(&mut f.session, &cash_with_ten_percent())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::CommitFailed { .. }));
        assert_eq!(f.inventory.stock("A").await, Some(5));
        assert_eq!(f.inventory.stock("B").await, Some(3));
        assert!(!f.session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_restores_all_lines() {
        let mut f = fixture();
        f.session.open_register(Money::from_cents(500)).unwrap();
        f.sales.set_fail_on_record(true).await;

        let err = f
            .committer
            .commit(&mut f.session, &cash_with_ten_percent())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::CommitFailed { .. }));
        assert_eq!(f.inventory.stock("A").await, Some(5));
        assert_eq!(f.inventory.stock("B").await, Some(3));
        assert_eq!(f.session.register_state().current_amount.cents(), 500);
        assert_eq!(f.session.ledger().movements().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_compensation_is_reported() {
        let mut f = fixture();
        f.sales.set_fail_on_record(true).await;
        f.inventory.set_fail_on_restock(true).await;

        let err = f
            .committer
            .commit(&mut f.session, &cash_with_ten_percent())
            .await
            .unwrap_err();

        match err {
            SessionError::CompensationFailed { unrestored, .. } => {
                assert_eq!(unrestored, vec!["B".to_string(), "A".to_string()]);
            }
            other => panic!("expected CompensationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_sale_restocks() {
        let mut f = fixture();
        let receipt = f
            .committer
            .commit(&mut f.session, &CheckoutRequest::new(PaymentMethod::Pix))
            .await
            .unwrap();

        let cancelled = f.committer.cancel_sale(&receipt.sale.id).await.unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(f.inventory.stock("A").await, Some(5));
        assert_eq!(f.inventory.stock("B").await, Some(3));

        let err = f.committer.cancel_sale(&receipt.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Core(CoreError::InvalidSaleStatus { .. })
        ));
        assert_eq!(f.inventory.stock("A").await, Some(5));
    }

    #[tokio::test]
    async fn test_cancel_reports_restock_failure() {
        let mut f = fixture();
        let receipt = f
            .committer
            .commit(&mut f.session, &CheckoutRequest::new(PaymentMethod::Card))
            .await
            .unwrap();
        f.inventory.set_fail_on_restock(true).await;

        let err = f.committer.cancel_sale(&receipt.sale.id).await.unwrap_err();
        assert!(matches!(err, SessionError::RestockFailed { ref unrestored, .. } if unrestored.len() == 2));

        let stored = f.sales.get_sale(&receipt.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_unknown_sale() {
        let f = fixture();
        let err = f.committer.cancel_sale("nope").await.unwrap_err();
        assert!(matches!(err, SessionError::Core(CoreError::SaleNotFound(_))));
    }
}

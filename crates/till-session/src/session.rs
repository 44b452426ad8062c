//! # Cashier Session
//!
//! One operator at one till: the cart being built and the cash register.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CashierSession                                     │
//! │                                                                         │
//! │  cashier: Cashier      who signs sales and movements                   │
//! │  cart:    Cart         mutated by add/set_quantity/remove/clear        │
//! │  ledger:  CashLedger   open/deposit/withdraw/close + sale movements    │
//! │                                                                         │
//! │  Passed by &mut to SaleCommitter::commit; nothing else holds it.       │
//! │                                                                         │
//! │  load_register(store) ◄── "cashRegister" document ──► save_register    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Register operations change memory only. Call [`CashierSession::save_register`]
//! after them (and after a cash commit) to persist the ledger.

use chrono::Utc;
use tracing::{debug, info};

use till_core::{
    Cart, CashLedger, CashMovement, CashRegisterSnapshot, CashRegisterState, Cashier, Money,
    Product, StateStore, StoreError, CASH_REGISTER_KEY,
};

use crate::error::SessionResult;

#[derive(Debug, Clone)]
pub struct CashierSession {
    cashier: Cashier,
    cart: Cart,
    ledger: CashLedger,
}

impl CashierSession {
    /// A session with an empty cart and a closed register with no history.
    pub fn new(cashier: Cashier) -> Self {
        CashierSession {
            cashier,
            cart: Cart::new(),
            ledger: CashLedger::new(),
        }
    }

    /// A session whose register is loaded from `store`.
    pub async fn load<S>(cashier: Cashier, store: &S) -> SessionResult<Self>
    where
        S: StateStore + ?Sized,
    {
        let mut session = Self::new(cashier);
        session.load_register(store).await?;
        Ok(session)
    }

    pub fn cashier(&self) -> &Cashier {
        &self.cashier
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn ledger(&self) -> &CashLedger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut CashLedger {
        &mut self.ledger
    }

    pub fn register_state(&self) -> &CashRegisterState {
        self.ledger.state()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of `product`. Returns the line's new quantity.
    pub fn add_product(&mut self, product: &Product) -> SessionResult<i64> {
        let quantity = self.cart.add(product)?;
        debug!(product_id = %product.id, quantity, "Added to cart");
        Ok(quantity)
    }

    // =========================================================================
    // Cash Register
    // =========================================================================

    pub fn open_register(&mut self, initial: Money) -> SessionResult<CashMovement> {
        let movement = self.ledger.open(initial, &self.cashier, Utc::now())?.clone();
        info!(cashier = %self.cashier.id, initial = %initial, "Cash register opened");
        Ok(movement)
    }

    pub fn deposit(&mut self, amount: Money) -> SessionResult<CashMovement> {
        let movement = self.ledger.deposit(amount, &self.cashier, Utc::now())?.clone();
        info!(amount = %amount, balance = %self.ledger.current_amount(), "Cash deposited");
        Ok(movement)
    }

    pub fn withdraw(&mut self, amount: Money, reason: &str) -> SessionResult<CashMovement> {
        let movement = self
            .ledger
            .withdraw(amount, reason, &self.cashier, Utc::now())?
            .clone();
        info!(amount = %amount, balance = %self.ledger.current_amount(), "Cash withdrawn");
        Ok(movement)
    }

    /// Closes the register. The returned movement carries the final balance.
    pub fn close_register(&mut self) -> SessionResult<CashMovement> {
        let movement = self.ledger.close(&self.cashier, Utc::now())?.clone();
        info!(cashier = %self.cashier.id, closing = %movement.amount, "Cash register closed");
        Ok(movement)
    }

    /// Books the cash sales committed while the register was closed.
    pub fn reconcile_pending(&mut self) -> SessionResult<usize> {
        let count = self.ledger.reconcile_pending(Utc::now())?;
        if count > 0 {
            info!(count, balance = %self.ledger.current_amount(), "Pending cash sales reconciled");
        }
        Ok(count)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Replaces the in-memory ledger with the stored `cashRegister` document.
    ///
    /// A missing document leaves a closed register with no history. A
    /// document whose totals disagree with its movements is rejected and the
    /// current ledger is kept.
    pub async fn load_register<S>(&mut self, store: &S) -> SessionResult<()>
    where
        S: StateStore + ?Sized,
    {
        let Some(value) = store.load(CASH_REGISTER_KEY).await? else {
            debug!("No stored cash register, starting closed");
            self.ledger = CashLedger::new();
            return Ok(());
        };

        let snapshot: CashRegisterSnapshot =
            serde_json::from_value(value).map_err(StoreError::from)?;
        self.ledger = CashLedger::from_snapshot(snapshot)?;

        debug!(
            movements = self.ledger.movements().len(),
            is_open = self.ledger.is_open(),
            "Cash register loaded"
        );
        Ok(())
    }

    /// Writes the ledger as the `cashRegister` document.
    pub async fn save_register<S>(&self, store: &S) -> SessionResult<()>
    where
        S: StateStore + ?Sized,
    {
        let value = serde_json::to_value(self.ledger.snapshot()).map_err(StoreError::from)?;
        store.save(CASH_REGISTER_KEY, &value).await?;
        debug!(movements = self.ledger.movements().len(), "Cash register saved");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::memory::InMemoryStateStore;
    use serde_json::json;
    use till_core::{CoreError, MovementKind};

    fn session() -> CashierSession {
        CashierSession::new(Cashier::new("u-1", "Ana"))
    }

    #[test]
    fn test_register_day() {
        let mut s = session();

        s.open_register(Money::from_cents(10000)).unwrap();
        s.deposit(Money::from_cents(5000)).unwrap();
        let w = s.withdraw(Money::from_cents(3000), "troco").unwrap();
        assert_eq!(w.description, "troco");
        assert_eq!(s.register_state().current_amount.cents(), 12000);
        assert_eq!(s.ledger().movements().len(), 3);

        let closing = s.close_register().unwrap();
        assert_eq!(closing.kind, MovementKind::Closing);
        assert_eq!(closing.amount.cents(), 12000);
        assert!(!s.register_state().is_open);
        assert_eq!(s.ledger().movements().len(), 4);
    }

    #[test]
    fn test_overdraw_leaves_register_unchanged() {
        let mut s = session();
        s.open_register(Money::from_cents(1000)).unwrap();

        let err = s.withdraw(Money::from_cents(5000), "").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Core(CoreError::InsufficientFunds { .. })
        ));
        assert_eq!(s.register_state().current_amount.cents(), 1000);
        assert_eq!(s.ledger().movements().len(), 1);
    }

    #[tokio::test]
    async fn test_save_and_load_register() {
        let store = InMemoryStateStore::new();
        let mut s = session();
        s.open_register(Money::from_cents(10000)).unwrap();
        s.deposit(Money::from_cents(2550)).unwrap();
        s.save_register(&store).await.unwrap();

        let loaded = CashierSession::load(Cashier::new("u-2", "Bia"), &store)
            .await
            .unwrap();
        assert_eq!(loaded.ledger(), s.ledger());
        assert_eq!(loaded.register_state().current_amount.cents(), 12550);

        let doc = store.get(CASH_REGISTER_KEY).await.unwrap();
        assert_eq!(doc["isOpen"], true);
        assert_eq!(doc["currentAmount"], 12550);
        assert_eq!(doc["movements"][1]["type"], "deposit");
    }

    #[tokio::test]
    async fn test_missing_document_starts_closed() {
        let store = InMemoryStateStore::new();
        let s = CashierSession::load(Cashier::new("u-1", "Ana"), &store)
            .await
            .unwrap();
        assert!(!s.register_state().is_open);
        assert!(s.ledger().movements().is_empty());
    }

    #[tokio::test]
    async fn test_tampered_document_rejected() {
        let store = InMemoryStateStore::new();
        let mut s = session();
        s.open_register(Money::from_cents(10000)).unwrap();
        s.save_register(&store).await.unwrap();

        let mut doc = store.get(CASH_REGISTER_KEY).await.unwrap();
        doc["currentAmount"] = json!(99999);
        store.save(CASH_REGISTER_KEY, &doc).await.unwrap();

        let err = s.load_register(&store).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Core(CoreError::LedgerMismatch { .. })
        ));
        // Current ledger kept
        assert_eq!(s.register_state().current_amount.cents(), 10000);
    }
}

//! # Cash Ledger
//!
//! The cash register: an append-only list of movements and the balance
//! derived from it.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            open(initial ≥ 0)                                            │
//! │   ┌────────┐ ──────────────────────────► ┌────────┐                    │
//! │   │ Closed │                             │  Open  │ ◄─┐ deposit(> 0)   │
//! │   └────────┘ ◄────────────────────────── └────────┘ ──┘ withdraw(≤ cur)│
//! │        │       close() appends closing        │         sale (cash)    │
//! │        │       with amount = current          │                        │
//! │        ▼                                      ▼                        │
//! │   cash sale → PendingCashSale          cash sale → Sale movement       │
//! │               (reconcile_pending                                       │
//! │                after next open)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Balance Derivation
//! ```text
//! movements:  opening 100.00 │ deposit 50.00 │ withdrawal 30.00 │ closing 120.00
//! state:      open  100.00   │ open  150.00  │ open  120.00     │ closed 0.00
//! ```
//!
//! The incrementally maintained state always equals [`CashLedger::fold`] of
//! the full movement list. [`CashLedger::verify`] checks that independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Cashier, Sale};

// =============================================================================
// Movements
// =============================================================================

/// What a movement does to the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MovementKind {
    Opening,
    Deposit,
    Withdrawal,
    Closing,
    Sale {
        #[serde(rename = "saleId")]
        sale_id: String,
    },
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Opening => "opening",
            MovementKind::Deposit => "deposit",
            MovementKind::Withdrawal => "withdrawal",
            MovementKind::Closing => "closing",
            MovementKind::Sale { .. } => "sale",
        }
    }
}

/// A single, immutable entry in the cash ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub id: String,
    #[serde(flatten)]
    pub kind: MovementKind,
    /// Never negative.
    pub amount: Money,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
}

/// A cash sale committed while the register was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCashSale {
    pub sale_id: String,
    pub amount: Money,
    pub received_at: DateTime<Utc>,
    pub cashier_id: String,
    pub cashier_name: String,
}

/// What happened to the cash side of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CashSaleOutcome {
    /// A `sale` movement was appended.
    #[serde(rename_all = "camelCase")]
    Recorded { movement_id: String },
    /// Register closed: kept as a pending cash sale.
    Deferred,
    /// Card or pix: the ledger is not involved.
    NotCash,
}

// =============================================================================
// Derived State
// =============================================================================

/// Register state derived from the movement list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterState {
    pub is_open: bool,
    pub initial_amount: Money,
    pub current_amount: Money,
    pub opened_at: Option<DateTime<Utc>>,
}

impl CashRegisterState {
    /// Applies one movement, rejecting anything no register operation
    /// could have produced.
    fn apply(&mut self, position: usize, movement: &CashMovement) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidLedger { position, reason };
        let amount = movement.amount;

        if amount.is_negative() {
            return Err(invalid(format!("negative amount {}", amount)));
        }

        match &movement.kind {
            MovementKind::Opening => {
                if self.is_open {
                    return Err(invalid("opening while already open".to_string()));
                }
                *self = CashRegisterState {
                    is_open: true,
                    initial_amount: amount,
                    current_amount: amount,
                    opened_at: Some(movement.timestamp),
                };
            }
            kind if !self.is_open => {
                return Err(invalid(format!("{} while closed", kind.as_str())));
            }
            MovementKind::Deposit => {
                if amount.is_zero() {
                    return Err(invalid("zero deposit".to_string()));
                }
                self.current_amount += amount;
            }
            MovementKind::Sale { .. } => {
                self.current_amount += amount;
            }
            MovementKind::Withdrawal => {
                if amount.is_zero() {
                    return Err(invalid("zero withdrawal".to_string()));
                }
                if amount > self.current_amount {
                    return Err(invalid(format!(
                        "withdrawal {} exceeds balance {}",
                        amount, self.current_amount
                    )));
                }
                self.current_amount -= amount;
            }
            MovementKind::Closing => {
                if amount != self.current_amount {
                    return Err(invalid(format!(
                        "closing amount {} differs from balance {}",
                        amount, self.current_amount
                    )));
                }
                *self = CashRegisterState::default();
            }
        }

        Ok(())
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// The persisted `cashRegister` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashRegisterSnapshot {
    pub is_open: bool,
    pub initial_amount: Money,
    pub current_amount: Money,
    pub movements: Vec<CashMovement>,
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_cash_sales: Vec<PendingCashSale>,
}

// =============================================================================
// Cash Ledger
// =============================================================================

/// The cash register with its full movement history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashLedger {
    state: CashRegisterState,
    movements: Vec<CashMovement>,
    pending: Vec<PendingCashSale>,
}

impl CashLedger {
    /// A closed register with no history.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CashRegisterState {
        &self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    #[inline]
    pub fn current_amount(&self) -> Money {
        self.state.current_amount
    }

    /// Full history, oldest first.
    pub fn movements(&self) -> &[CashMovement] {
        &self.movements
    }

    pub fn pending_cash_sales(&self) -> &[PendingCashSale] {
        &self.pending
    }

    /// Movements since the most recent opening (inclusive).
    pub fn session_movements(&self) -> &[CashMovement] {
        let start = self
            .movements
            .iter()
            .rposition(|m| m.kind == MovementKind::Opening);

        match start {
            Some(index) => &self.movements[index..],
            None => &[],
        }
    }

    // =========================================================================
    // Register Operations
    // =========================================================================

    /// Opens the register with `initial` in the drawer.
    ///
    /// ## Errors
    /// - `AlreadyOpen` if the register is open
    /// - `InvalidAmount` if `initial` is negative
    pub fn open(
        &mut self,
        initial: Money,
        cashier: &Cashier,
        at: DateTime<Utc>,
    ) -> CoreResult<&CashMovement> {
        if self.state.is_open {
            return Err(CoreError::AlreadyOpen);
        }
        if initial.is_negative() {
            return Err(CoreError::invalid_amount(initial, "opening amount cannot be negative"));
        }

        self.append(MovementKind::Opening, initial, "Abertura de caixa", cashier, at)
    }

    /// Adds cash to the drawer.
    pub fn deposit(
        &mut self,
        amount: Money,
        cashier: &Cashier,
        at: DateTime<Utc>,
    ) -> CoreResult<&CashMovement> {
        if !self.state.is_open {
            return Err(CoreError::RegisterClosed);
        }
        if !amount.is_positive() {
            return Err(CoreError::invalid_amount(amount, "deposit must be positive"));
        }

        self.append(MovementKind::Deposit, amount, "Depósito em caixa", cashier, at)
    }

    /// Takes cash out of the drawer. A blank reason gets a default description.
    ///
    /// ## Errors
    /// Checked in this order, state and log unchanged on failure:
    /// - `RegisterClosed`
    /// - `InvalidAmount` if `amount` ≤ 0
    /// - `InsufficientFunds` if `amount` > current balance
    pub fn withdraw(
        &mut self,
        amount: Money,
        reason: &str,
        cashier: &Cashier,
        at: DateTime<Utc>,
    ) -> CoreResult<&CashMovement> {
        if !self.state.is_open {
            return Err(CoreError::RegisterClosed);
        }
        if !amount.is_positive() {
            return Err(CoreError::invalid_amount(amount, "withdrawal must be positive"));
        }
        if amount > self.state.current_amount {
            return Err(CoreError::InsufficientFunds {
                requested: amount,
                available: self.state.current_amount,
            });
        }

        let reason = reason.trim();
        let description = if reason.is_empty() {
            "Retirada de caixa"
        } else {
            reason
        };
        self.append(MovementKind::Withdrawal, amount, description, cashier, at)
    }

    /// Closes the register. The closing movement carries the final balance.
    pub fn close(&mut self, cashier: &Cashier, at: DateTime<Utc>) -> CoreResult<&CashMovement> {
        if !self.state.is_open {
            return Err(CoreError::RegisterClosed);
        }

        let amount = self.state.current_amount;
        self.append(MovementKind::Closing, amount, "Fechamento de caixa", cashier, at)
    }

    /// Records the cash side of a committed sale.
    ///
    /// Card and pix sales are ignored. A cash sale while the register is
    /// closed is kept as pending; it is not an error.
    pub fn record_sale(&mut self, sale: &Sale, at: DateTime<Utc>) -> CashSaleOutcome {
        if !sale.payment_method.is_cash() {
            return CashSaleOutcome::NotCash;
        }

        let cashier = Cashier::new(sale.cashier_id.clone(), sale.cashier_name.clone());

        if !self.state.is_open {
            self.pending.push(PendingCashSale {
                sale_id: sale.id.clone(),
                amount: sale.total(),
                received_at: at,
                cashier_id: cashier.id,
                cashier_name: cashier.name,
            });
            return CashSaleOutcome::Deferred;
        }

        let id = self.push_sale_movement(&sale.id, sale.total(), &cashier, at);
        CashSaleOutcome::Recorded { movement_id: id }
    }

    /// Appends a `sale` movement for every pending cash sale, oldest first.
    ///
    /// Returns the number of sales reconciled.
    pub fn reconcile_pending(&mut self, at: DateTime<Utc>) -> CoreResult<usize> {
        if !self.state.is_open {
            return Err(CoreError::RegisterClosed);
        }

        let pending = std::mem::take(&mut self.pending);
        for entry in &pending {
            let cashier = Cashier::new(entry.cashier_id.clone(), entry.cashier_name.clone());
            self.push_sale_movement(&entry.sale_id, entry.amount, &cashier, at);
        }

        Ok(pending.len())
    }

    fn push_sale_movement(
        &mut self,
        sale_id: &str,
        amount: Money,
        cashier: &Cashier,
        at: DateTime<Utc>,
    ) -> String {
        let kind = MovementKind::Sale {
            sale_id: sale_id.to_string(),
        };
        let description = format!("Venda #{}", sale_id);
        let movement = self.build_movement(kind, amount, &description, cashier, at);
        let id = movement.id.clone();
        self.state.current_amount += amount;
        self.movements.push(movement);
        id
    }

    fn append(
        &mut self,
        kind: MovementKind,
        amount: Money,
        description: &str,
        cashier: &Cashier,
        at: DateTime<Utc>,
    ) -> CoreResult<&CashMovement> {
        let movement = self.build_movement(kind, amount, description, cashier, at);

        let mut next = self.state.clone();
        next.apply(self.movements.len(), &movement)?;
        self.state = next;
        self.movements.push(movement);

        Ok(&self.movements[self.movements.len() - 1])
    }

    fn build_movement(
        &self,
        kind: MovementKind,
        amount: Money,
        description: &str,
        cashier: &Cashier,
        at: DateTime<Utc>,
    ) -> CashMovement {
        // Timestamps never go backwards, even if the clock does.
        let timestamp = match self.movements.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };

        CashMovement {
            id: Uuid::new_v4().to_string(),
            kind,
            amount,
            description: description.to_string(),
            timestamp,
            user_id: cashier.id.clone(),
            user_name: cashier.name.clone(),
        }
    }

    // =========================================================================
    // Replay & Verification
    // =========================================================================

    /// Folds a movement list into the register state it produces.
    ///
    /// ## Errors
    /// `InvalidLedger` for sequences no register operations can produce:
    /// opening while open, anything but opening while closed, overdrawn
    /// withdrawals, closings that disagree with the balance, negative
    /// amounts, or timestamps that go backwards.
    pub fn fold(movements: &[CashMovement]) -> CoreResult<CashRegisterState> {
        let mut state = CashRegisterState::default();
        let mut previous: Option<DateTime<Utc>> = None;

        for (position, movement) in movements.iter().enumerate() {
            if let Some(prev) = previous {
                if movement.timestamp < prev {
                    return Err(CoreError::InvalidLedger {
                        position,
                        reason: "timestamp earlier than previous movement".to_string(),
                    });
                }
            }
            previous = Some(movement.timestamp);
            state.apply(position, movement)?;
        }

        Ok(state)
    }

    /// Rebuilds a ledger from its movements alone.
    pub fn replay(movements: Vec<CashMovement>) -> CoreResult<Self> {
        let state = Self::fold(&movements)?;
        Ok(CashLedger {
            state,
            movements,
            pending: Vec::new(),
        })
    }

    /// Checks the incrementally maintained state against a fresh fold.
    pub fn verify(&self) -> CoreResult<()> {
        let replayed = Self::fold(&self.movements)?;
        if replayed != self.state {
            return Err(CoreError::LedgerMismatch {
                stored: self.state.current_amount,
                replayed: replayed.current_amount,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Persistence Shape
    // =========================================================================

    pub fn snapshot(&self) -> CashRegisterSnapshot {
        CashRegisterSnapshot {
            is_open: self.state.is_open,
            initial_amount: self.state.initial_amount,
            current_amount: self.state.current_amount,
            movements: self.movements.clone(),
            opened_at: self.state.opened_at,
            pending_cash_sales: self.pending.clone(),
        }
    }

    /// Loads a persisted document, re-folding its movements.
    ///
    /// ## Errors
    /// - `InvalidLedger` if the movement order is impossible
    /// - `LedgerMismatch` if the stored fields disagree with the fold
    pub fn from_snapshot(snapshot: CashRegisterSnapshot) -> CoreResult<Self> {
        let stored = CashRegisterState {
            is_open: snapshot.is_open,
            initial_amount: snapshot.initial_amount,
            current_amount: snapshot.current_amount,
            opened_at: snapshot.opened_at,
        };

        let replayed = Self::fold(&snapshot.movements)?;
        if replayed != stored {
            return Err(CoreError::LedgerMismatch {
                stored: stored.current_amount,
                replayed: replayed.current_amount,
            });
        }

        Ok(CashLedger {
            state: replayed,
            movements: snapshot.movements,
            pending: snapshot.pending_cash_sales,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Sale Repository
//!
//! Database operations for sales, sale items and payments.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMMIT (one transaction)                                           │
//! │     └── insert_sale()                                                  │
//! │         ├── INSERT INTO sales       (header, status = completed)       │
//! │         ├── INSERT INTO sale_items  (one row per line, by position)    │
//! │         └── INSERT INTO payments    (amount = sale total)              │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_by_id() / list_between(from, to)                           │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── mark_cancelled() → status = cancelled, cancelled_at set        │
//! │         (only from completed; any other status is rejected)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are never updated otherwise and never deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::sale::payment_for;
use till_core::{
    Payment, PaymentMethod, Sale, SaleItem, SaleStatus, SaleStore, StoreResult,
};

const SALE_COLUMNS: &str = r#"
    id, customer_id, customer_name, cashier_id, cashier_name,
    subtotal_cents, discount_bps, discount_cents, total_cents,
    payment_method, status, created_at, cancelled_at
"#;

// =============================================================================
// Row Types
// =============================================================================

/// `sales` row. Items are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    customer_id: Option<String>,
    customer_name: Option<String>,
    cashier_id: String,
    cashier_name: String,
    subtotal_cents: i64,
    discount_bps: i64,
    discount_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    status: SaleStatus,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> DbResult<Sale> {
        let discount_bps = u32::try_from(self.discount_bps).map_err(|_| {
            DbError::Internal(format!(
                "sale {} has discount_bps {}",
                self.id, self.discount_bps
            ))
        })?;

        Ok(Sale {
            id: self.id,
            items,
            subtotal_cents: self.subtotal_cents,
            discount_bps,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            status: self.status,
            cashier_id: self.cashier_id,
            cashier_name: self.cashier_name,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleItemRow {
    sale_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    subtotal_cents: i64,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            subtotal_cents: row.subtotal_cents,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes the sale header, its items and its payment as one unit.
    ///
    /// Either all three land or none do. A duplicate sale id fails with
    /// `UniqueViolation` and writes nothing.
    pub async fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        debug!(
            id = %sale.id,
            items = sale.items.len(),
            total_cents = sale.total_cents,
            "Inserting sale"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, customer_name, cashier_id, cashier_name,
                subtotal_cents, discount_bps, discount_cents, total_cents,
                payment_method, status, created_at, cancelled_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.customer_name)
        .bind(&sale.cashier_id)
        .bind(&sale.cashier_name)
        .bind(sale.subtotal_cents)
        .bind(i64::from(sale.discount_bps))
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(sale.created_at)
        .bind(sale.cancelled_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, position, product_id, product_name,
                    quantity, unit_price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.subtotal_cents)
            .execute(&mut *tx)
            .await?;
        }

        let payment = payment_for(sale);
        debug!(sale_id = %payment.sale_id, amount = payment.amount_cents, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO payments (id, sale_id, method, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
        let row = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.get_items(id).await?;
        row.into_sale(items).map(Some)
    }

    /// Items of one sale, in cart order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT sale_id, product_id, product_name, quantity, unit_price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleItem::from).collect())
    }

    /// Sales created in `[from, to)`, oldest first, with their items.
    pub async fn list_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at, id",
            SALE_COLUMNS
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        let item_rows = sqlx::query_as::<_, SaleItemRow>(
            r#"
            SELECT si.sale_id, si.product_id, si.product_name,
                   si.quantity, si.unit_price_cents, si.subtotal_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            ORDER BY si.sale_id, si.position
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.sale_id.clone()).or_default().push(row.into());
        }

        debug!(count = rows.len(), %from, %to, "Listed sales");

        rows.into_iter()
            .map(|row| {
                let sale_items = items.remove(&row.id).unwrap_or_default();
                row.into_sale(sale_items)
            })
            .collect()
    }

    /// Moves a completed sale to cancelled.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The sale as stored after the transition
    /// * `Err(DbError::InvalidSaleStatus)` - Sale is not completed
    /// * `Err(DbError::NotFound)` - No such sale
    pub async fn mark_cancelled(&self, id: &str, at: DateTime<Utc>) -> DbResult<Sale> {
        debug!(id = %id, "Cancelling sale");

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'cancelled',
                cancelled_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let status: Option<SaleStatus> =
                sqlx::query_scalar("SELECT status FROM sales WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match status {
                None => DbError::not_found("Sale", id),
                Some(status) => DbError::InvalidSaleStatus {
                    sale_id: id.to_string(),
                    current_status: status.to_string(),
                },
            });
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Gets all payments for a sale.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, sale_id, method, amount_cents, created_at
            FROM payments
            WHERE sale_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}

// =============================================================================
// SaleStore
// =============================================================================

#[async_trait]
impl SaleStore for SaleRepository {
    async fn record_sale(&self, sale: &Sale) -> StoreResult<()> {
        Ok(self.insert_sale(sale).await?)
    }

    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn list_sales(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
        Ok(self.list_between(from, to).await?)
    }

    async fn mark_cancelled(&self, id: &str, at: DateTime<Utc>) -> StoreResult<Sale> {
        Ok(SaleRepository::mark_cancelled(self, id, at).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

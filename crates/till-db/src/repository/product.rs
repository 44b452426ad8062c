//! # Product Repository
//!
//! Catalog CRUD and stock movements for products.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Compare-and-Decrement                                │
//! │                                                                         │
//! │  ❌ WRONG: read, check, then write                                     │
//! │     SELECT stock ...         → 1                                       │
//! │     (another checkout takes the last unit here)                        │
//! │     UPDATE products SET stock = 0                                      │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                 │
//! │     UPDATE products SET stock = stock - ?2                             │
//! │     WHERE id = ?1 AND stock >= ?2                                      │
//! │     RETURNING stock                                                    │
//! │                                                                         │
//! │  No row returned → the product is missing or short on stock;          │
//! │  a follow-up read tells which.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::validation::{validate_product, validate_product_update};
use till_core::{
    InventoryStore, Product, ProductInput, ProductUpdate, StoreResult, ValidationError,
};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, sku, barcode,
    price_cents, stock, category, is_active,
    created_at, updated_at
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.insert(&input).await?;
/// let remaining = repo.take_stock(&product.id, 2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Active products ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Active products with `stock <= threshold`, lowest stock first.
    ///
    /// Callers usually pass [`till_core::LOW_STOCK_THRESHOLD`].
    pub async fn list_low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 AND stock <= ?1 ORDER BY stock, name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), threshold, "Listed low-stock products");
        Ok(products)
    }

    /// Gets a product by its ID, including soft-deleted ones.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE sku = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product with a fresh id.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - Input failed field checks
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        validate_product(input)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            sku: input.sku.as_ref().map(|s| s.trim().to_string()),
            barcode: input.barcode.clone(),
            price_cents: input.price_cents,
            stock: input.stock,
            category: input.category.trim().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, sku, barcode,
                price_cents, stock, category, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Replaces a product's catalog fields.
    ///
    /// Stock is left alone; it changes only through [`Self::take_stock`]
    /// and [`Self::return_stock`].
    pub async fn update(&self, id: &str, input: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(input)?;

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                sku = ?4,
                barcode = ?5,
                price_cents = ?6,
                category = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.sku.as_ref().map(|s| s.trim().to_string()))
        .bind(&input.barcode)
        .bind(input.price_cents)
        .bind(input.category.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Past sales keep their item snapshots either way.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomically takes `quantity` units. Returns the remaining stock.
    pub async fn take_stock(&self, id: &str, quantity: i64) -> DbResult<i64> {
        ensure_positive(quantity)?;
        debug!(id = %id, quantity, "Decrementing stock");

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(remaining);
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match available {
            None => Err(DbError::not_found("Product", id)),
            Some(available) => Err(DbError::InsufficientStock {
                product_id: id.to_string(),
                available,
                requested: quantity,
            }),
        }
    }

    /// Returns `quantity` units to stock. Returns the new stock level.
    pub async fn return_stock(&self, id: &str, quantity: i64) -> DbResult<i64> {
        ensure_positive(quantity)?;
        debug!(id = %id, quantity, "Restocking");

        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        stock.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn ensure_positive(quantity: i64) -> DbResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::MAX,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// InventoryStore
// =============================================================================

#[async_trait]
impl InventoryStore for ProductRepository {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.list_active().await?)
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.get_by_id(id).await?)
    }

    async fn decrement_stock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
        Ok(self.take_stock(id, quantity).await?)
    }

    async fn restock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
        Ok(self.return_stock(id, quantity).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # In-Memory Stores
//!
//! Store trait implementations backed by memory, for tests and demos.
//!
//! Each store can be told to fail, so the commit protocol's compensation
//! paths can be driven without a database:
//!
//! ```text
//! InMemoryInventory::fail_decrement_for("p-2")  → decrement of p-2 errors
//! InMemoryInventory::set_fail_on_restock(true)  → every restock errors
//! InMemorySaleStore::set_fail_on_record(true)   → record_sale errors
//! InMemoryStateStore::set_fail_on_save(true)    → save errors
//! ```
//!
//! Clones share state, so a test can keep a handle after moving one into a
//! `SaleCommitter`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use till_core::{
    InventoryStore, Product, Sale, SaleStatus, SaleStore, StateStore, StoreError, StoreResult,
};

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Default)]
struct InventoryState {
    products: Vec<Product>,
    fail_decrement: HashSet<String>,
    fail_on_restock: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        InMemoryInventory {
            state: Arc::new(RwLock::new(InventoryState {
                products,
                ..Default::default()
            })),
        }
    }

    /// Adds a product or replaces the one with the same id.
    pub async fn upsert(&self, product: Product) {
        let mut state = self.state.write().await;
        match state.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => state.products.push(product),
        }
    }

    pub async fn stock(&self, id: &str) -> Option<i64> {
        let state = self.state.read().await;
        state.products.iter().find(|p| p.id == id).map(|p| p.stock)
    }

    /// Changes stock behind the cart's back, as another till would.
    pub async fn set_stock(&self, id: &str, stock: i64) {
        let mut state = self.state.write().await;
        if let Some(product) = state.products.iter_mut().find(|p| p.id == id) {
            product.stock = stock;
        }
    }

    /// Makes every decrement of `id` fail with a backend error.
    pub async fn fail_decrement_for(&self, id: &str) {
        self.state.write().await.fail_decrement.insert(id.to_string());
    }

    pub async fn set_fail_on_restock(&self, fail: bool) {
        self.state.write().await.fail_on_restock = fail;
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().filter(|p| p.is_active).cloned().collect())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn decrement_stock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
        let mut state = self.state.write().await;

        if state.fail_decrement.contains(id) {
            return Err(StoreError::Backend(format!("injected decrement failure for {}", id)));
        }

        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::ProductNotFound(id.to_string()))?;

        if quantity <= 0 || product.stock < quantity {
            return Err(StoreError::InsufficientStock {
                product_id: id.to_string(),
                available: product.stock,
                requested: quantity,
            });
        }

        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(product.stock)
    }

    async fn restock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
        let mut state = self.state.write().await;

        if state.fail_on_restock {
            return Err(StoreError::Backend(format!("injected restock failure for {}", id)));
        }

        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::ProductNotFound(id.to_string()))?;

        product.stock += quantity;
        product.updated_at = Utc::now();
        Ok(product.stock)
    }
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Default)]
struct SaleState {
    sales: Vec<Sale>,
    fail_on_record: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySaleStore {
    state: Arc<RwLock<SaleState>>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_record(&self, fail: bool) {
        self.state.write().await.fail_on_record = fail;
    }

    pub async fn sale_count(&self) -> usize {
        self.state.read().await.sales.len()
    }
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn record_sale(&self, sale: &Sale) -> StoreResult<()> {
        let mut state = self.state.write().await;

        if state.fail_on_record {
            return Err(StoreError::Backend("injected record failure".to_string()));
        }
        if state.sales.iter().any(|s| s.id == sale.id) {
            return Err(StoreError::Backend(format!("duplicate sale id {}", sale.id)));
        }

        state.sales.push(sale.clone());
        Ok(())
    }

    async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        let state = self.state.read().await;
        Ok(state.sales.iter().find(|s| s.id == id).cloned())
    }

    async fn list_sales(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Sale>> {
        let state = self.state.read().await;
        let mut sales: Vec<Sale> = state
            .sales
            .iter()
            .filter(|s| s.created_at >= from && s.created_at < to)
            .cloned()
            .collect();
        sales.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sales)
    }

    async fn mark_cancelled(&self, id: &str, at: DateTime<Utc>) -> StoreResult<Sale> {
        let mut state = self.state.write().await;
        let sale = state
            .sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::SaleNotFound(id.to_string()))?;

        if sale.status != SaleStatus::Completed {
            return Err(StoreError::InvalidSaleStatus {
                sale_id: id.to_string(),
                current_status: sale.status.to_string(),
            });
        }

        sale.status = SaleStatus::Cancelled;
        sale.cancelled_at = Some(at);
        Ok(sale.clone())
    }
}

// =============================================================================
// Key-Value State
// =============================================================================

#[derive(Debug, Default)]
struct KvState {
    documents: HashMap<String, Value>,
    fail_on_save: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    state: Arc<RwLock<KvState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.state.read().await.documents.get(key).cloned()
    }

    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.get(key).await)
    }

    async fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.fail_on_save {
            return Err(StoreError::Backend("injected save failure".to_string()));
        }
        state.documents.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: None,
            sku: None,
            barcode: None,
            price_cents: 100,
            stock,
            category: "Geral".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let inventory = InMemoryInventory::with_products(vec![product("p-1", 2)]);

        assert_eq!(inventory.decrement_stock("p-1", 2).await.unwrap(), 0);
        let err = inventory.decrement_stock("p-1", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { available: 0, .. }));

        assert_eq!(inventory.restock("p-1", 2).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let inventory = InMemoryInventory::with_products(vec![product("p-1", 5)]);
        inventory.fail_decrement_for("p-1").await;
        assert!(matches!(
            inventory.decrement_stock("p-1", 1).await,
            Err(StoreError::Backend(_))
        ));
        assert_eq!(inventory.stock("p-1").await, Some(5));

        let state = InMemoryStateStore::new();
        state.set_fail_on_save(true).await;
        assert!(state.save("k", &json!(1)).await.is_err());
        assert_eq!(state.load("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let inventory = InMemoryInventory::new();
        let handle = inventory.clone();
        inventory.upsert(product("p-1", 3)).await;
        assert_eq!(handle.stock("p-1").await, Some(3));
    }
}

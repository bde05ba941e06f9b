use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    ProductId, Result, Stock, StockStoreError, Version,
    store::{StockStore, StockTransaction, validate_write},
};

type Records = Arc<RwLock<HashMap<ProductId, Stock>>>;

/// In-memory stock store implementation.
///
/// Provides the same interface and the same version semantics as the
/// PostgreSQL implementation. Used by tests and by services started without
/// a database.
#[derive(Clone, Default)]
pub struct InMemoryStockStore {
    stocks: Records,
}

impl InMemoryStockStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records stored.
    pub async fn record_count(&self) -> usize {
        self.stocks.read().await.len()
    }
}

fn conflict(stock: &Stock) -> StockStoreError {
    StockStoreError::ConcurrencyConflict {
        product_id: stock.product_id,
        expected: stock.version,
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    type Transaction = InMemoryStockTransaction;

    async fn get(&self, product_id: ProductId) -> Result<Option<Stock>> {
        Ok(self.stocks.read().await.get(&product_id).copied())
    }

    async fn create(&self, product_id: ProductId) -> Result<Stock> {
        let mut stocks = self.stocks.write().await;
        if stocks.contains_key(&product_id) {
            return Err(StockStoreError::AlreadyExists(product_id));
        }
        let stock = Stock::new(product_id);
        stocks.insert(product_id, stock);
        Ok(stock)
    }

    async fn write(&self, stock: &Stock) -> Result<Stock> {
        validate_write(stock)?;

        let mut stocks = self.stocks.write().await;
        let stored = stocks
            .get_mut(&stock.product_id)
            .filter(|stored| stored.version == stock.version)
            .ok_or_else(|| conflict(stock))?;

        stored.quantity = stock.quantity;
        stored.version = stock.version.next();
        Ok(*stored)
    }

    async fn delete_by_product_id(&self, product_id: ProductId) -> Result<()> {
        self.stocks.write().await.remove(&product_id);
        Ok(())
    }

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(InMemoryStockTransaction {
            stocks: Arc::clone(&self.stocks),
            staged: HashMap::new(),
        })
    }
}

#[derive(Debug)]
struct StagedWrite {
    /// Version of the committed record this write was derived from.
    base_version: Version,
    stock: Stock,
}

/// Transaction over an [`InMemoryStockStore`].
///
/// Writes are buffered and only touch the shared map on commit, which
/// re-checks the base version of every staged record under the write lock
/// and applies all of them or none.
pub struct InMemoryStockTransaction {
    stocks: Records,
    staged: HashMap<ProductId, StagedWrite>,
}

#[async_trait]
impl StockTransaction for InMemoryStockTransaction {
    async fn get(&mut self, product_id: ProductId) -> Result<Option<Stock>> {
        if let Some(staged) = self.staged.get(&product_id) {
            return Ok(Some(staged.stock));
        }
        Ok(self.stocks.read().await.get(&product_id).copied())
    }

    async fn write(&mut self, stock: &Stock) -> Result<Stock> {
        validate_write(stock)?;

        let current = self.get(stock.product_id).await?;
        let current = current
            .filter(|current| current.version == stock.version)
            .ok_or_else(|| conflict(stock))?;

        let base_version = self
            .staged
            .get(&stock.product_id)
            .map_or(current.version, |staged| staged.base_version);
        let written = Stock {
            version: stock.version.next(),
            ..*stock
        };
        self.staged.insert(
            stock.product_id,
            StagedWrite {
                base_version,
                stock: written,
            },
        );
        Ok(written)
    }

    async fn commit(self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let mut stocks = self.stocks.write().await;

        // Verify everything first so a conflict leaves the map untouched.
        for (product_id, staged) in &self.staged {
            let unchanged = stocks
                .get(product_id)
                .is_some_and(|stored| stored.version == staged.base_version);
            if !unchanged {
                return Err(StockStoreError::ConcurrencyConflict {
                    product_id: *product_id,
                    expected: staged.base_version,
                });
            }
        }

        for (product_id, staged) in self.staged {
            stocks.insert(product_id, staged.stock);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!(staged = self.staged.len(), "discarding staged stock writes");
        Ok(())
    }
}

use async_trait::async_trait;

use crate::{ProductId, Result, Stock, StockStoreError};

/// Core trait for stock store implementations.
///
/// The store keeps one versioned record per product. The only concurrency
/// primitive it offers is the conditional [`write`](StockStore::write);
/// callers that need several writes to become visible together use a
/// transaction obtained from [`begin`](StockStore::begin).
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Transaction type handed out by [`begin`](StockStore::begin).
    type Transaction: StockTransaction;

    /// Retrieves the record of a product.
    ///
    /// Returns None if the product has no record.
    async fn get(&self, product_id: ProductId) -> Result<Option<Stock>>;

    /// Creates a record with quantity 0 at the initial version.
    ///
    /// Fails with `AlreadyExists` if the product already has a record.
    async fn create(&self, product_id: ProductId) -> Result<Stock>;

    /// Writes a record if its stored version still equals `stock.version`.
    ///
    /// On success the stored version is incremented by 1 and the stored
    /// record is returned. Fails with `ConcurrencyConflict` if the version
    /// moved on or the record no longer exists.
    async fn write(&self, stock: &Stock) -> Result<Stock>;

    /// Deletes the record of a product. Deleting a missing record is a no-op.
    async fn delete_by_product_id(&self, product_id: ProductId) -> Result<()>;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Transaction>;
}

/// A unit of work over several stock records.
///
/// Writes made through the transaction are visible to its own reads but to
/// nobody else until [`commit`](StockTransaction::commit), which makes all of
/// them visible at once or fails without applying any. Dropping a
/// transaction without committing discards its writes.
#[async_trait]
pub trait StockTransaction: Send {
    /// Retrieves a record as seen by this transaction.
    async fn get(&mut self, product_id: ProductId) -> Result<Option<Stock>>;

    /// Stages a conditional write; same contract as [`StockStore::write`].
    async fn write(&mut self, stock: &Stock) -> Result<Stock>;

    /// Applies every staged write atomically.
    async fn commit(self) -> Result<()>;

    /// Discards every staged write.
    async fn rollback(self) -> Result<()>;
}

/// Rejects writes that would break the non-negative quantity invariant.
pub(crate) fn validate_write(stock: &Stock) -> Result<()> {
    if stock.quantity < 0 {
        return Err(StockStoreError::NegativeQuantity {
            product_id: stock.product_id,
            quantity: stock.quantity,
        });
    }
    Ok(())
}

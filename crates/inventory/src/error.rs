//! Stock service error types.

use common::ProductId;
use stock_store::StockStoreError;
use thiserror::Error;

/// Errors that can occur during stock operations.
///
/// Insufficient stock is not an error: it is one of the
/// [`ReservationOutcome`](crate::ReservationOutcome)s of a reservation.
#[derive(Debug, Error)]
pub enum StockError {
    /// A product with this id already has a stock record.
    #[error("Stock already exists for productId {0}")]
    AlreadyExists(ProductId),

    /// The product has no stock record.
    #[error("Unknown productId {0}")]
    UnknownProduct(ProductId),

    /// Someone else modified the stock since it was read. Not retried.
    #[error("Operation failed for productId {0} due to concurrent modification")]
    ConcurrencyConflict(ProductId),

    /// Quantities in requests must be positive.
    #[error("Invalid quantity {quantity} for productId {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// The store failed for operational reasons.
    #[error("Stock store error: {0}")]
    Store(StockStoreError),
}

impl From<StockStoreError> for StockError {
    fn from(err: StockStoreError) -> Self {
        match err {
            StockStoreError::AlreadyExists(product_id) => StockError::AlreadyExists(product_id),
            StockStoreError::ConcurrencyConflict { product_id, .. } => {
                StockError::ConcurrencyConflict(product_id)
            }
            other => StockError::Store(other),
        }
    }
}

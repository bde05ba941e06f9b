use thiserror::Error;

use crate::{ProductId, Version};

/// Errors that can occur when interacting with the stock store.
#[derive(Debug, Error)]
pub enum StockStoreError {
    /// A record for the product already exists.
    #[error("Stock already exists for product {0}")]
    AlreadyExists(ProductId),

    /// The record was modified (or deleted) since the writer read it.
    #[error("Concurrency conflict for product {product_id}: expected version {expected}")]
    ConcurrencyConflict {
        product_id: ProductId,
        expected: Version,
    },

    /// A write would leave the record with a negative quantity.
    #[error("Negative quantity {quantity} for product {product_id}")]
    NegativeQuantity { product_id: ProductId, quantity: i64 },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for stock store operations.
pub type Result<T> = std::result::Result<T, StockStoreError>;

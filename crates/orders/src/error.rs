//! Order service error types.

use thiserror::Error;

/// Errors talking to the stock service.
///
/// These are transport or protocol faults. A reservation the stock service
/// declined is not an error here; it is a [`ReservationReply`](crate::ReservationReply).
#[derive(Debug, Error)]
pub enum StockClientError {
    /// The request could not be sent or no response arrived in time.
    #[error("stock service unreachable: {0}")]
    Network(String),

    /// The stock service answered with a status it should never send.
    #[error("stock service returned unexpected status {0}")]
    UnexpectedStatus(u16),
}

/// Errors from an order repository.
#[derive(Debug, Error)]
pub enum OrderRepositoryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored order lines could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order request is malformed; nothing was sent to the stock service.
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// The stock service declined the reservation for any reason.
    #[error("Insufficient stocks")]
    ReservationRejected,

    /// The stock service could not be reached or answered nonsense.
    #[error("Stock service error: {0}")]
    StockService(#[from] StockClientError),

    /// The order could not be stored or loaded.
    #[error("Order repository error: {0}")]
    Repository(#[from] OrderRepositoryError),
}

/// Convenience type alias for order results.
pub type Result<T> = std::result::Result<T, OrderError>;

//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::wire::{InsufficientStocksResponse, ResponseBody};
use inventory::StockError;
use orders::OrderError;

const INSUFFICIENT_STOCKS: &str = "Insufficient stocks";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// A reservation failed; carries what was available for each short line.
    InsufficientStocks(InsufficientStocksResponse),
    /// Stock service error.
    Stock(StockError),
    /// Order service error.
    Order(OrderError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InsufficientStocks(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, INSUFFICIENT_STOCKS.to_string())
            }
            ApiError::Stock(err) => match err {
                StockError::AlreadyExists(_) | StockError::ConcurrencyConflict(_) => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                StockError::UnknownProduct(_) => (StatusCode::NOT_FOUND, err.to_string()),
                StockError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
                StockError::Store(_) => internal(err),
            },
            ApiError::Order(err) => match err {
                OrderError::InvalidOrder(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                OrderError::ReservationRejected => {
                    (StatusCode::UNPROCESSABLE_ENTITY, INSUFFICIENT_STOCKS.to_string())
                }
                OrderError::StockService(_) => {
                    tracing::error!(error = %err, "stock service unavailable");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Stock service unavailable".to_string(),
                    )
                }
                OrderError::Repository(_) => internal(err),
            },
        }
    }
}

fn internal(err: &dyn std::error::Error) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match self {
            ApiError::InsufficientStocks(payload) => {
                (status, Json(ResponseBody::message_with_data(message, payload))).into_response()
            }
            _ => (status, Json(ResponseBody::<()>::message(message))).into_response(),
        }
    }
}

impl From<StockError> for ApiError {
    fn from(err: StockError) -> Self {
        ApiError::Stock(err)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

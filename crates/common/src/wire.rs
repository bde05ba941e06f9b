//! JSON bodies exchanged between the stock service, the order service and
//! their clients.

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// A product together with a quantity.
///
/// Used for reservation lines, order lines and for reporting the quantity
/// that is currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl StockLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Body of `POST /stock/reserve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub reservations: Vec<StockLine>,
}

/// Payload of a reservation rejected for insufficient stock: one entry per
/// insufficient line with the quantity that was available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientStocksResponse {
    pub available_stocks: Vec<StockLine>,
}

/// Body of `PUT /stock/{productId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

/// Common envelope of every response body.
///
/// Successful responses carry `data`; rejections carry a `message` and
/// optionally `data` with details. Absent fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ResponseBody<T> {
    pub fn data(data: T) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn message_with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_line_uses_camel_case() {
        let json = serde_json::to_value(StockLine::new(1, 10)).unwrap();
        assert_eq!(json, serde_json::json!({"productId": 1, "quantity": 10}));
    }

    #[test]
    fn envelope_omits_missing_fields() {
        let body: ResponseBody<()> = ResponseBody::message("Insufficient stocks");
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"message":"Insufficient stocks"}"#);
    }

    #[test]
    fn insufficient_stocks_payload_shape() {
        let body = ResponseBody::message_with_data(
            "Insufficient stocks",
            InsufficientStocksResponse {
                available_stocks: vec![StockLine::new(1, 5), StockLine::new(2, 5)],
            },
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["data"]["availableStocks"][1]["productId"], 2);
        assert_eq!(json["data"]["availableStocks"][1]["quantity"], 5);
    }

    #[test]
    fn envelope_parses_without_data() {
        let body: ResponseBody<InsufficientStocksResponse> =
            serde_json::from_str(r#"{"message":"Unknown productId 3"}"#).unwrap();
        assert!(body.data.is_none());
        assert_eq!(body.message.as_deref(), Some("Unknown productId 3"));
    }
}

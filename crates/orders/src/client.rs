//! Client side of the stock service's reservation endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    REQUEST_ID_HEADER, RequestContext, RequestId,
    wire::{ReservationRequest, ResponseBody, StockLine},
};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use crate::error::StockClientError;

/// What the stock service decided about a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationReply {
    /// Every line was reserved.
    Reserved,
    /// The stock service declined the batch. Details are kept for logging
    /// only; callers treat every rejection alike.
    Rejected { status: u16, message: Option<String> },
}

/// Reserves stock on behalf of the order service.
#[async_trait]
pub trait StockClient: Send + Sync {
    /// Asks the stock service to reserve every line of `lines`, or none.
    async fn reserve(
        &self,
        ctx: &RequestContext,
        lines: &[StockLine],
    ) -> Result<ReservationReply, StockClientError>;
}

/// [`StockClient`] calling `POST {base_url}/stock/reserve` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStockClient {
    client: Client,
    base_url: String,
}

impl HttpStockClient {
    /// Creates a client for the stock service at `base_url`
    /// (e.g. `http://localhost:8080`). Every call is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StockClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockClientError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl StockClient for HttpStockClient {
    #[tracing::instrument(
        skip(self, ctx, lines),
        fields(request_id = %ctx.request_id(), lines = lines.len())
    )]
    async fn reserve(
        &self,
        ctx: &RequestContext,
        lines: &[StockLine],
    ) -> Result<ReservationReply, StockClientError> {
        let request = ReservationRequest {
            reservations: lines.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/stock/reserve", self.base_url))
            .header(REQUEST_ID_HEADER, ctx.request_id().as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| StockClientError::Network(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::OK => Ok(ReservationReply::Reserved),
            StatusCode::UNPROCESSABLE_ENTITY
            | StatusCode::NOT_FOUND
            | StatusCode::CONFLICT
            | StatusCode::BAD_REQUEST => {
                // The status alone decides; the message only feeds the log.
                let message = response
                    .json::<ResponseBody<serde_json::Value>>()
                    .await
                    .ok()
                    .and_then(|body| body.message);
                Ok(ReservationReply::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
            other => Err(StockClientError::UnexpectedStatus(other.as_u16())),
        }
    }
}

/// How an [`InMemoryStockClient`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptedReply {
    #[default]
    Reserve,
    Reject,
    Unreachable,
}

#[derive(Debug, Default)]
struct InMemoryClientState {
    reply: ScriptedReply,
    calls: Vec<(RequestId, Vec<StockLine>)>,
}

/// Scripted stock client for testing. Records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockClient {
    state: Arc<Mutex<InMemoryClientState>>,
}

impl InMemoryStockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how subsequent calls are answered.
    pub async fn set_reply(&self, reply: ScriptedReply) {
        self.state.lock().await.reply = reply;
    }

    /// Returns the calls received so far, oldest first.
    pub async fn calls(&self) -> Vec<(RequestId, Vec<StockLine>)> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl StockClient for InMemoryStockClient {
    async fn reserve(
        &self,
        ctx: &RequestContext,
        lines: &[StockLine],
    ) -> Result<ReservationReply, StockClientError> {
        let mut state = self.state.lock().await;
        state.calls.push((ctx.request_id().clone(), lines.to_vec()));

        match state.reply {
            ScriptedReply::Reserve => Ok(ReservationReply::Reserved),
            ScriptedReply::Reject => Ok(ReservationReply::Rejected {
                status: 422,
                message: Some("Insufficient stocks".to_string()),
            }),
            ScriptedReply::Unreachable => Err(StockClientError::Network(
                "connection refused".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_client_trims_trailing_slash() {
        let client = HttpStockClient::new("http://stock:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://stock:8080");
    }

    #[tokio::test]
    async fn in_memory_client_records_calls() {
        let client = InMemoryStockClient::new();
        let ctx = RequestContext::from_header(Some("req-1"));

        let reply = client.reserve(&ctx, &[StockLine::new(1, 2)]).await.unwrap();

        assert_eq!(reply, ReservationReply::Reserved);
        let calls = client.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_str(), "req-1");
        assert_eq!(calls[0].1, vec![StockLine::new(1, 2)]);
    }

    #[tokio::test]
    async fn unreachable_http_service_is_a_network_error() {
        // Port 9 (discard) is essentially never served on loopback.
        let client = HttpStockClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client
            .reserve(&RequestContext::new(), &[StockLine::new(1, 1)])
            .await;

        assert!(matches!(result, Err(StockClientError::Network(_))));
    }
}

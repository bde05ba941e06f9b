//! Order endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::wire::{ResponseBody, StockLine};
use common::{OrderId, RequestContext};
use orders::{OrderRepository, OrderService, StockClient};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared state of the order service.
pub type OrderState<C, R> = Arc<OrderService<C, R>>;

/// Body of `POST /order`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateOrderRequest {
    pub orders: Vec<StockLine>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub orders: Vec<StockLine>,
}

/// POST /order
pub async fn create<C, R>(
    State(service): State<OrderState<C, R>>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ResponseBody<OrderCreatedResponse>>), ApiError>
where
    C: StockClient + 'static,
    R: OrderRepository + 'static,
{
    let Json(request) = payload?;

    let order_id = service.create(&ctx, request.orders).await?;

    Ok((
        StatusCode::CREATED,
        Json(ResponseBody::data(OrderCreatedResponse { order_id })),
    ))
}

/// GET /order/{orderId}. Malformed ids are reported as not found.
pub async fn get<C, R>(
    State(service): State<OrderState<C, R>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<ResponseBody<OrderResponse>>, ApiError>
where
    C: StockClient + 'static,
    R: OrderRepository + 'static,
{
    let not_found = || ApiError::NotFound(format!("Order {id} not found"));

    let order_id: OrderId = id.parse().map_err(|_| not_found())?;
    let order = service.get(&ctx, order_id).await?.ok_or_else(not_found)?;

    Ok(Json(ResponseBody::data(OrderResponse {
        order_id: order.id,
        orders: order.lines,
    })))
}

//! Stock endpoints.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::wire::{
    InsufficientStocksResponse, ReservationRequest, ResponseBody, RestockRequest, StockLine,
};
use common::{ProductId, RequestContext};
use inventory::{ReservationLine, ReservationOutcome, Shortfall, Stock, StockError, StockService};
use stock_store::StockStore;

use crate::error::ApiError;

/// Shared state of the stock service.
pub type StockState<S> = Arc<StockService<S>>;

fn line_of(stock: &Stock) -> StockLine {
    StockLine::new(stock.product_id, stock.quantity)
}

fn available_line(shortfall: &Shortfall) -> StockLine {
    StockLine::new(shortfall.product_id, shortfall.available)
}

/// GET /stock/{productId}
pub async fn get<S: StockStore + 'static>(
    State(service): State<StockState<S>>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ResponseBody<StockLine>>, ApiError> {
    let Path(product_id) = path?;
    let product_id = ProductId::new(product_id);

    let stock = service
        .get(&ctx, product_id)
        .await?
        .ok_or(StockError::UnknownProduct(product_id))?;

    Ok(Json(ResponseBody::data(line_of(&stock))))
}

/// POST /stock/{productId}
pub async fn create<S: StockStore + 'static>(
    State(service): State<StockState<S>>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(product_id) = path?;

    service.create(&ctx, ProductId::new(product_id)).await?;

    Ok(StatusCode::CREATED)
}

/// PUT /stock/{productId}: adds the given quantity.
pub async fn restock<S: StockStore + 'static>(
    State(service): State<StockState<S>>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Json<ResponseBody<StockLine>>, ApiError> {
    let Path(product_id) = path?;
    let Json(request) = payload?;

    let stock = service
        .restock(&ctx, ProductId::new(product_id), request.quantity)
        .await?;

    Ok(Json(ResponseBody::data(line_of(&stock))))
}

/// DELETE /stock/{productId}
pub async fn remove<S: StockStore + 'static>(
    State(service): State<StockState<S>>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(product_id) = path?;

    service.remove(&ctx, ProductId::new(product_id)).await?;

    Ok(StatusCode::OK)
}

/// POST /stock/reserve
pub async fn reserve<S: StockStore + 'static>(
    State(service): State<StockState<S>>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;
    let lines: Vec<ReservationLine> = request
        .reservations
        .iter()
        .map(|line| ReservationLine::new(line.product_id, line.quantity))
        .collect();

    match service.reserve(&ctx, &lines).await? {
        ReservationOutcome::Reserved => Ok(StatusCode::OK),
        ReservationOutcome::InsufficientStock(shortfalls) => {
            Err(ApiError::InsufficientStocks(InsufficientStocksResponse {
                available_stocks: shortfalls.iter().map(available_line).collect(),
            }))
        }
        ReservationOutcome::UnknownProduct(product_id) => {
            Err(StockError::UnknownProduct(product_id).into())
        }
    }
}

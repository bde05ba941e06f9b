//! HTTP front ends of the stock service and the order service.
//!
//! Both services share the same surface conventions: `{message, data}`
//! response envelopes, an `X-Request-Id` correlation header, structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use inventory::StockService;
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{OrderRepository, OrderService, StockClient};
use stock_store::StockStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the stock service router.
pub fn create_stock_app<S: StockStore + 'static>(
    service: Arc<StockService<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let router = Router::new()
        .route("/stock/reserve", post(routes::stock::reserve::<S>))
        .route(
            "/stock/{product_id}",
            get(routes::stock::get::<S>)
                .post(routes::stock::create::<S>)
                .put(routes::stock::restock::<S>)
                .delete(routes::stock::remove::<S>),
        )
        .with_state(service);

    with_common_layers(router, metrics_handle)
}

/// Creates the order service router.
pub fn create_order_app<C, R>(
    service: Arc<OrderService<C, R>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    C: StockClient + 'static,
    R: OrderRepository + 'static,
{
    let router = Router::new()
        .route("/order", post(routes::orders::create::<C, R>))
        .route("/order/{order_id}", get(routes::orders::get::<C, R>))
        .with_state(service);

    with_common_layers(router, metrics_handle)
}

fn with_common_layers(router: Router, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    router
        .route("/health", get(routes::ops::health))
        .merge(metrics_router)
        .layer(axum::middleware::from_fn(middleware::request_context))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

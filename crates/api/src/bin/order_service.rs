//! Order service entry point.

use std::sync::Arc;

use api::config::{Config, ORDER_SERVICE_PORT};
use api::telemetry;
use orders::{HttpStockClient, InMemoryOrderRepository, OrderService, PostgresOrderRepository};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env(ORDER_SERVICE_PORT).expect("invalid configuration");
    telemetry::init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle =
        telemetry::install_metrics_recorder().expect("failed to install Prometheus recorder");

    // 3. Build the stock service client
    let stock = HttpStockClient::new(&config.stock_service_url, config.stock_service_timeout)
        .expect("failed to build stock service client");
    tracing::info!(url = %stock.base_url(), "stock service client ready");

    // 4. Pick the order repository and build the application
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let repository = PostgresOrderRepository::new(pool);
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL order repository");
            api::create_order_app(Arc::new(OrderService::new(stock, repository)), metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory order repository");
            api::create_order_app(
                Arc::new(OrderService::new(stock, InMemoryOrderRepository::new())),
                metrics_handle,
            )
        }
    };

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting order service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("order service shut down gracefully");
}

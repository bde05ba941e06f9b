//! Stock service entry point.

use std::sync::Arc;

use api::config::{Config, STOCK_SERVICE_PORT};
use api::telemetry;
use inventory::StockService;
use sqlx::postgres::PgPoolOptions;
use stock_store::{InMemoryStockStore, PostgresStockStore};

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env(STOCK_SERVICE_PORT).expect("invalid configuration");
    telemetry::init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle =
        telemetry::install_metrics_recorder().expect("failed to install Prometheus recorder");

    // 3. Pick the storage backend and build the application
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStockStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL stock store");
            api::create_stock_app(Arc::new(StockService::new(store)), metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory stock store");
            api::create_stock_app(
                Arc::new(StockService::new(InMemoryStockStore::new())),
                metrics_handle,
            )
        }
    };

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting stock service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("stock service shut down gracefully");
}

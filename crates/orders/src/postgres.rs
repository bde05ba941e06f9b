use async_trait::async_trait;
use common::{OrderId, wire::StockLine};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::OrderRepositoryError;
use crate::order::Order;
use crate::repository::OrderRepository;

/// PostgreSQL-backed order repository.
///
/// Lines are stored as a JSONB array in the same camelCase shape the HTTP
/// API uses.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), OrderRepositoryError> {
        sqlx::migrate!("../../migrations/orders")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order, OrderRepositoryError> {
        let lines: serde_json::Value = row.try_get("lines")?;
        let lines: Vec<StockLine> = serde_json::from_value(lines)?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get("id")?),
            lines,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        let lines = serde_json::to_value(&order.lines)?;

        sqlx::query("INSERT INTO orders (id, lines, created_at) VALUES ($1, $2, $3)")
            .bind(order.id.as_uuid())
            .bind(lines)
            .bind(order.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        let row = sqlx::query("SELECT id, lines, created_at FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }
}

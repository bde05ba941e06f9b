use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use crate::{
    ProductId, Result, Stock, StockStoreError, Version,
    store::{StockStore, StockTransaction, validate_write},
};

const SELECT_STOCK: &str = "SELECT product_id, quantity, version FROM stocks WHERE product_id = $1";

// Zero affected rows means the version moved on or the row is gone.
const CONDITIONAL_UPDATE: &str = r#"
    UPDATE stocks
    SET quantity = $2, version = version + 1
    WHERE product_id = $1 AND version = $3
    RETURNING product_id, quantity, version
"#;

// Applies a staged record whose version may have advanced several times
// inside the transaction.
const COMMIT_UPDATE: &str = r#"
    UPDATE stocks
    SET quantity = $2, version = $4
    WHERE product_id = $1 AND version = $3
"#;

/// PostgreSQL-backed stock store implementation.
#[derive(Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Creates a new PostgreSQL stock store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/stock")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_stock(row: PgRow) -> Result<Stock> {
        Ok(Stock {
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn map_write_error(stock: &Stock, error: sqlx::Error) -> StockStoreError {
        if let sqlx::Error::Database(ref db_err) = error {
            if db_err.is_check_violation() {
                return StockStoreError::NegativeQuantity {
                    product_id: stock.product_id,
                    quantity: stock.quantity,
                };
            }
            if is_lost_race(db_err.code().as_deref()) {
                return conflict(stock);
            }
        }
        StockStoreError::Database(error)
    }
}

/// Deadlock (40P01) and serialization failure (40001) abort the losing
/// writer just like a stale version does.
fn is_lost_race(code: Option<&str>) -> bool {
    matches!(code, Some("40P01" | "40001"))
}

fn conditional_update(
    stock: &Stock,
) -> sqlx::query::Query<'static, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(CONDITIONAL_UPDATE)
        .bind(stock.product_id.as_i64())
        .bind(stock.quantity)
        .bind(stock.version.as_i64())
}

fn conflict(stock: &Stock) -> StockStoreError {
    StockStoreError::ConcurrencyConflict {
        product_id: stock.product_id,
        expected: stock.version,
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    type Transaction = PostgresStockTransaction;

    async fn get(&self, product_id: ProductId) -> Result<Option<Stock>> {
        let row = sqlx::query(SELECT_STOCK)
            .bind(product_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_stock).transpose()
    }

    async fn create(&self, product_id: ProductId) -> Result<Stock> {
        let stock = Stock::new(product_id);

        sqlx::query("INSERT INTO stocks (product_id, quantity, version) VALUES ($1, $2, $3)")
            .bind(product_id.as_i64())
            .bind(stock.quantity)
            .bind(stock.version.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StockStoreError::AlreadyExists(product_id);
                }
                StockStoreError::Database(e)
            })?;

        Ok(stock)
    }

    async fn write(&self, stock: &Stock) -> Result<Stock> {
        validate_write(stock)?;

        let row = conditional_update(stock)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::map_write_error(stock, e))?;

        match row {
            Some(row) => Self::row_to_stock(row),
            None => Err(conflict(stock)),
        }
    }

    async fn delete_by_product_id(&self, product_id: ProductId) -> Result<()> {
        sqlx::query("DELETE FROM stocks WHERE product_id = $1")
            .bind(product_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(PostgresStockTransaction {
            pool: self.pool.clone(),
            staged: BTreeMap::new(),
        })
    }
}

#[derive(Debug)]
struct StagedWrite {
    /// Version of the committed record this write was derived from.
    base_version: Version,
    stock: Stock,
}

/// Transaction over a [`PostgresStockStore`].
///
/// Writes are buffered in memory and reads of unstaged records go straight to
/// the pool, so no row lock is held while the caller is still deciding. On
/// commit every staged record is applied with a version-checked update inside
/// one database transaction, in ascending product id order. Two commits that
/// touch the same products therefore lock rows in the same order and cannot
/// deadlock; the one that arrives second finds a moved version and fails with
/// a conflict.
pub struct PostgresStockTransaction {
    pool: PgPool,
    staged: BTreeMap<ProductId, StagedWrite>,
}

#[async_trait]
impl StockTransaction for PostgresStockTransaction {
    async fn get(&mut self, product_id: ProductId) -> Result<Option<Stock>> {
        if let Some(staged) = self.staged.get(&product_id) {
            return Ok(Some(staged.stock));
        }

        let row = sqlx::query(SELECT_STOCK)
            .bind(product_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(PostgresStockStore::row_to_stock).transpose()
    }

    async fn write(&mut self, stock: &Stock) -> Result<Stock> {
        validate_write(stock)?;

        let current = self
            .get(stock.product_id)
            .await?
            .filter(|current| current.version == stock.version)
            .ok_or_else(|| conflict(stock))?;

        let base_version = self
            .staged
            .get(&stock.product_id)
            .map_or(current.version, |staged| staged.base_version);
        let written = Stock {
            version: stock.version.next(),
            ..*stock
        };
        self.staged.insert(
            stock.product_id,
            StagedWrite {
                base_version,
                stock: written,
            },
        );
        Ok(written)
    }

    async fn commit(self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for staged in self.staged.values() {
            let expected = Stock {
                version: staged.base_version,
                ..staged.stock
            };

            let result = sqlx::query(COMMIT_UPDATE)
                .bind(expected.product_id.as_i64())
                .bind(staged.stock.quantity)
                .bind(staged.base_version.as_i64())
                .bind(staged.stock.version.as_i64())
                .execute(&mut *tx)
                .await
                .map_err(|e| PostgresStockStore::map_write_error(&expected, e))?;

            // Dropping `tx` rolls back whatever was applied so far.
            if result.rows_affected() == 0 {
                return Err(conflict(&expected));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!(staged = self.staged.len(), "discarding staged stock writes");
        Ok(())
    }
}

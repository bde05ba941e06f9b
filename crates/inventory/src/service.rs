//! Stock service providing the product lifecycle, reservations and restocks.

use std::time::Instant;

use common::{ProductId, RequestContext};
use stock_store::{Stock, StockStore, StockTransaction};

use crate::error::StockError;
use crate::reservation::{self, ReservationLine, ReservationOutcome};

/// Service for managing stock records.
///
/// Every write goes through the store's conditional write, so concurrent
/// callers are serialized by version checks alone. Nothing is retried: a lost
/// race surfaces as [`StockError::ConcurrencyConflict`].
pub struct StockService<S: StockStore> {
    store: S,
}

impl<S: StockStore> StockService<S> {
    /// Creates a new stock service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a product with quantity 0.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
    ) -> Result<Stock, StockError> {
        let stock = self.store.create(product_id).await?;
        tracing::info!(%product_id, "stock created");
        Ok(stock)
    }

    /// Loads the stock of a product.
    ///
    /// Returns None if the product has no record.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn get(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
    ) -> Result<Option<Stock>, StockError> {
        Ok(self.store.get(product_id).await?)
    }

    /// Removes a product. Removing an unknown product succeeds.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn remove(&self, ctx: &RequestContext, product_id: ProductId) -> Result<(), StockError> {
        self.store.delete_by_product_id(product_id).await?;
        tracing::info!(%product_id, "stock removed");
        Ok(())
    }

    /// Reserves every line of a batch, or none of them.
    ///
    /// The batch runs inside one store transaction. Shortfalls and unknown
    /// products roll it back and are reported as outcomes; only a fully
    /// satisfiable batch is committed.
    #[tracing::instrument(
        skip(self, ctx, lines),
        fields(request_id = %ctx.request_id(), lines = lines.len())
    )]
    pub async fn reserve(
        &self,
        ctx: &RequestContext,
        lines: &[ReservationLine],
    ) -> Result<ReservationOutcome, StockError> {
        for line in lines {
            validate_quantity(line.product_id, line.quantity)?;
        }

        tracing::info!("reservation started");
        let started = Instant::now();

        let result = self.reserve_in_transaction(lines).await;

        metrics::histogram!("stock_reservation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                metrics::counter!("stock_reservations_total", "outcome" => outcome.label())
                    .increment(1);
                tracing::info!(outcome = outcome.label(), "reservation finished");
            }
            Err(StockError::ConcurrencyConflict(product_id)) => {
                metrics::counter!("stock_reservations_total", "outcome" => "conflict")
                    .increment(1);
                metrics::counter!("stock_concurrency_conflicts_total").increment(1);
                tracing::warn!(%product_id, "reservation lost a concurrent update");
            }
            Err(error) => {
                metrics::counter!("stock_reservations_total", "outcome" => "error").increment(1);
                tracing::error!(%error, "reservation failed");
            }
        }

        result
    }

    async fn reserve_in_transaction(
        &self,
        lines: &[ReservationLine],
    ) -> Result<ReservationOutcome, StockError> {
        let mut tx = self.store.begin().await?;

        // On error the transaction is dropped, which discards staged writes.
        let outcome = reservation::scan(&mut tx, lines).await?;

        if outcome.is_reserved() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }

        Ok(outcome)
    }

    /// Adds `quantity` to the stock of a product.
    ///
    /// The write is conditioned on the version just read; if another writer
    /// got there first the restock fails with a conflict.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn restock(
        &self,
        ctx: &RequestContext,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock, StockError> {
        validate_quantity(product_id, quantity)?;

        let current = self
            .store
            .get(product_id)
            .await?
            .ok_or(StockError::UnknownProduct(product_id))?;

        let total = current
            .quantity
            .checked_add(quantity)
            .ok_or(StockError::InvalidQuantity {
                product_id,
                quantity,
            })?;

        match self.store.write(&current.with_quantity(total)).await {
            Ok(stock) => {
                metrics::counter!("stock_restocks_total").increment(1);
                tracing::info!(%product_id, quantity = stock.quantity, version = %stock.version, "restocked");
                Ok(stock)
            }
            Err(error) => {
                let error = StockError::from(error);
                if matches!(error, StockError::ConcurrencyConflict(_)) {
                    metrics::counter!("stock_concurrency_conflicts_total").increment(1);
                    tracing::warn!(%product_id, "restock lost a concurrent update");
                }
                Err(error)
            }
        }
    }
}

fn validate_quantity(product_id: ProductId, quantity: i64) -> Result<(), StockError> {
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity {
            product_id,
            quantity,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stock_store::{InMemoryStockStore, Version};

    fn ctx() -> RequestContext {
        RequestContext::default()
    }

    async fn service_with(entries: &[(i64, i64)]) -> StockService<InMemoryStockStore> {
        let service = StockService::new(InMemoryStockStore::new());
        for &(product, quantity) in entries {
            let product_id = ProductId::new(product);
            service.create(&ctx(), product_id).await.unwrap();
            if quantity > 0 {
                service.restock(&ctx(), product_id, quantity).await.unwrap();
            }
        }
        service
    }

    async fn quantity_of(service: &StockService<InMemoryStockStore>, product: i64) -> i64 {
        service
            .get(&ctx(), ProductId::new(product))
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn create_starts_at_zero() {
        let service = service_with(&[]).await;
        let stock = service.create(&ctx(), ProductId::new(1)).await.unwrap();

        assert_eq!(stock.quantity, 0);
        assert_eq!(stock.version, Version::initial());
    }

    #[tokio::test]
    async fn create_twice_fails() {
        let service = service_with(&[(7, 0)]).await;
        let result = service.create(&ctx(), ProductId::new(7)).await;

        assert!(matches!(result, Err(StockError::AlreadyExists(p)) if p == ProductId::new(7)));
    }

    #[tokio::test]
    async fn restock_adds_and_bumps_version() {
        let service = service_with(&[(7, 0)]).await;
        let stock = service.restock(&ctx(), ProductId::new(7), 5).await.unwrap();

        assert_eq!(stock.quantity, 5);
        assert_eq!(stock.version, Version::new(1));
    }

    #[tokio::test]
    async fn restock_unknown_product() {
        let service = service_with(&[]).await;
        let result = service.restock(&ctx(), ProductId::new(9), 5).await;

        assert!(matches!(result, Err(StockError::UnknownProduct(_))));
    }

    #[tokio::test]
    async fn restock_rejects_non_positive_quantity() {
        let service = service_with(&[(7, 3)]).await;

        for quantity in [0, -1] {
            let result = service.restock(&ctx(), ProductId::new(7), quantity).await;
            assert!(matches!(result, Err(StockError::InvalidQuantity { .. })));
        }
        assert_eq!(quantity_of(&service, 7).await, 3);
    }

    #[tokio::test]
    async fn restock_rejects_overflow() {
        let service = service_with(&[(7, i64::MAX)]).await;
        let result = service.restock(&ctx(), ProductId::new(7), 1).await;

        assert!(matches!(result, Err(StockError::InvalidQuantity { .. })));
        assert_eq!(quantity_of(&service, 7).await, i64::MAX);
    }

    #[tokio::test]
    async fn reserve_whole_quantity() {
        let service = service_with(&[(1, 10)]).await;
        let outcome = service
            .reserve(&ctx(), &[ReservationLine::new(1, 10)])
            .await
            .unwrap();

        assert_eq!(outcome, ReservationOutcome::Reserved);
        assert_eq!(quantity_of(&service, 1).await, 0);
    }

    #[tokio::test]
    async fn reserve_rejects_non_positive_line_before_touching_store() {
        let service = service_with(&[(1, 10)]).await;
        let result = service
            .reserve(
                &ctx(),
                &[ReservationLine::new(1, 2), ReservationLine::new(1, 0)],
            )
            .await;

        assert!(matches!(result, Err(StockError::InvalidQuantity { quantity: 0, .. })));
        assert_eq!(quantity_of(&service, 1).await, 10);
    }

    #[tokio::test]
    async fn failed_reservation_leaves_versions_alone() {
        let service = service_with(&[(1, 5), (2, 50)]).await;
        let before = service.get(&ctx(), ProductId::new(2)).await.unwrap();

        let outcome = service
            .reserve(
                &ctx(),
                &[ReservationLine::new(2, 10), ReservationLine::new(1, 10)],
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ReservationOutcome::InsufficientStock(_)));
        assert_eq!(service.get(&ctx(), ProductId::new(2)).await.unwrap(), before);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let service = service_with(&[(1, 5)]).await;

        service.remove(&ctx(), ProductId::new(1)).await.unwrap();
        service.remove(&ctx(), ProductId::new(1)).await.unwrap();

        assert!(service.get(&ctx(), ProductId::new(1)).await.unwrap().is_none());
    }
}

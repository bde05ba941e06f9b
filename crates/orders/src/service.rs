//! Order orchestration: reserve remotely, then record.

use common::{OrderId, RequestContext, wire::StockLine};

use crate::client::{ReservationReply, StockClient};
use crate::error::{OrderError, Result};
use crate::order::Order;
use crate::repository::OrderRepository;

/// Creates and looks up orders.
///
/// The order service owns nothing about inventory: it only learns whether
/// the stock service reserved the whole batch.
pub struct OrderService<C: StockClient, R: OrderRepository> {
    stock: C,
    repository: R,
}

impl<C: StockClient, R: OrderRepository> OrderService<C, R> {
    /// Creates a new order service.
    pub fn new(stock: C, repository: R) -> Self {
        Self { stock, repository }
    }

    pub fn stock_client(&self) -> &C {
        &self.stock
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Reserves `lines` with the stock service and records an order for them.
    ///
    /// Any rejection by the stock service becomes
    /// [`OrderError::ReservationRejected`]; failing to reach it is an
    /// [`OrderError::StockService`]. If recording fails after a successful
    /// reservation the stock stays reserved.
    #[tracing::instrument(
        skip(self, ctx, lines),
        fields(request_id = %ctx.request_id(), lines = lines.len())
    )]
    pub async fn create(&self, ctx: &RequestContext, lines: Vec<StockLine>) -> Result<OrderId> {
        validate(&lines)?;

        match self.stock.reserve(ctx, &lines).await {
            Ok(ReservationReply::Reserved) => {}
            Ok(ReservationReply::Rejected { status, message }) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::info!(status, message = ?message, "reservation rejected");
                return Err(OrderError::ReservationRejected);
            }
            Err(error) => {
                tracing::error!(%error, "stock service call failed");
                return Err(error.into());
            }
        }

        let order = Order::new(lines);
        if let Err(error) = self.repository.save(&order).await {
            metrics::counter!("orders_persist_failures_total").increment(1);
            tracing::error!(
                %error,
                order_id = %order.id,
                lines = ?order.lines,
                "stock was reserved but the order could not be recorded"
            );
            return Err(error.into());
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, "order created");
        Ok(order.id)
    }

    /// Loads an order by id. Returns None if there is no such order.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn get(&self, ctx: &RequestContext, id: OrderId) -> Result<Option<Order>> {
        Ok(self.repository.find(id).await?)
    }
}

fn validate(lines: &[StockLine]) -> Result<()> {
    if lines.is_empty() {
        return Err(OrderError::InvalidOrder(
            "order must contain at least one line".to_string(),
        ));
    }
    if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
        return Err(OrderError::InvalidOrder(format!(
            "quantity for productId {} must be greater than 0, got {}",
            line.product_id, line.quantity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::client::{InMemoryStockClient, ScriptedReply};
    use crate::error::OrderRepositoryError;
    use crate::memory::InMemoryOrderRepository;

    struct BrokenRepository;

    #[async_trait]
    impl OrderRepository for BrokenRepository {
        async fn save(&self, _order: &Order) -> std::result::Result<(), OrderRepositoryError> {
            Err(OrderRepositoryError::Database(sqlx::Error::PoolClosed))
        }

        async fn find(
            &self,
            _id: OrderId,
        ) -> std::result::Result<Option<Order>, OrderRepositoryError> {
            Err(OrderRepositoryError::Database(sqlx::Error::PoolClosed))
        }
    }

    fn service() -> OrderService<InMemoryStockClient, InMemoryOrderRepository> {
        OrderService::new(InMemoryStockClient::new(), InMemoryOrderRepository::new())
    }

    #[tokio::test]
    async fn reserved_order_is_recorded() {
        let service = service();
        let ctx = RequestContext::new();
        let lines = vec![StockLine::new(1, 2), StockLine::new(2, 1)];

        let id = service.create(&ctx, lines.clone()).await.unwrap();

        let order = service.get(&ctx, id).await.unwrap().unwrap();
        assert_eq!(order.lines, lines);
    }

    #[tokio::test]
    async fn request_id_is_forwarded() {
        let service = service();
        let ctx = RequestContext::from_header(Some("req-42"));

        service
            .create(&ctx, vec![StockLine::new(1, 1)])
            .await
            .unwrap();

        let calls = service.stock_client().calls().await;
        assert_eq!(calls[0].0.as_str(), "req-42");
    }

    #[tokio::test]
    async fn rejection_records_nothing() {
        let service = service();
        service.stock_client().set_reply(ScriptedReply::Reject).await;

        let result = service
            .create(&RequestContext::new(), vec![StockLine::new(1, 5)])
            .await;

        assert!(matches!(result, Err(OrderError::ReservationRejected)));
        assert_eq!(service.repository().order_count().await, 0);
    }

    #[tokio::test]
    async fn unreachable_stock_service_is_not_a_rejection() {
        let service = service();
        service
            .stock_client()
            .set_reply(ScriptedReply::Unreachable)
            .await;

        let result = service
            .create(&RequestContext::new(), vec![StockLine::new(1, 5)])
            .await;

        assert!(matches!(result, Err(OrderError::StockService(_))));
        assert_eq!(service.repository().order_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_orders_never_reach_the_stock_service() {
        let service = service();

        let empty = service.create(&RequestContext::new(), vec![]).await;
        let zero = service
            .create(&RequestContext::new(), vec![StockLine::new(1, 0)])
            .await;

        assert!(matches!(empty, Err(OrderError::InvalidOrder(_))));
        assert!(matches!(zero, Err(OrderError::InvalidOrder(_))));
        assert!(service.stock_client().calls().await.is_empty());
    }

    #[tokio::test]
    async fn persist_failure_after_reservation_surfaces() {
        let client = InMemoryStockClient::new();
        let service = OrderService::new(client.clone(), BrokenRepository);

        let result = service
            .create(&RequestContext::new(), vec![StockLine::new(1, 1)])
            .await;

        assert!(matches!(result, Err(OrderError::Repository(_))));
        // The reservation went through and is not undone.
        assert_eq!(client.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_order_is_none() {
        let service = service();
        let found = service
            .get(&RequestContext::new(), OrderId::new())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}

use async_trait::async_trait;
use common::OrderId;

use crate::error::OrderRepositoryError;
use crate::order::Order;

/// Storage for recorded orders.
///
/// Orders are written once and never updated.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order.
    async fn save(&self, order: &Order) -> Result<(), OrderRepositoryError>;

    /// Loads an order by id. Returns None if there is no such order.
    async fn find(&self, id: OrderId) -> Result<Option<Order>, OrderRepositoryError>;
}

//! Batch reservation types and the scan over a batch.

use common::ProductId;
use stock_store::{StockStoreError, StockTransaction};

/// One line of a reservation batch: decrement `product_id` by `quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl ReservationLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// An insufficient line of a failed batch, with what was available when the
/// line was examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub product_id: ProductId,
    pub available: i64,
}

/// Result of a reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// Every line was decremented.
    Reserved,
    /// At least one line exceeded availability; nothing was decremented.
    /// Lists every insufficient line in batch order.
    InsufficientStock(Vec<Shortfall>),
    /// A line referenced a product without a record; nothing was
    /// decremented and the scan stopped there.
    UnknownProduct(ProductId),
}

impl ReservationOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ReservationOutcome::Reserved => "reserved",
            ReservationOutcome::InsufficientStock(_) => "insufficient_stock",
            ReservationOutcome::UnknownProduct(_) => "unknown_product",
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, ReservationOutcome::Reserved)
    }
}

/// Walks the batch in order inside `tx`, staging a decrement for every line
/// that can be satisfied.
///
/// Insufficient lines are collected and the scan continues so the caller
/// learns about all of them; an unknown product stops the scan. The caller
/// commits only when this returns [`ReservationOutcome::Reserved`].
///
/// Lines for the same product are applied one after the other: a later line
/// sees the quantity left by the earlier ones.
pub(crate) async fn scan<T: StockTransaction>(
    tx: &mut T,
    lines: &[ReservationLine],
) -> Result<ReservationOutcome, StockStoreError> {
    let mut shortfalls = Vec::new();

    for line in lines {
        let Some(stock) = tx.get(line.product_id).await? else {
            tracing::info!(product_id = %line.product_id, "unknown product in reservation");
            return Ok(ReservationOutcome::UnknownProduct(line.product_id));
        };

        let remaining = stock.quantity - line.quantity;
        if remaining < 0 {
            tracing::info!(
                product_id = %line.product_id,
                requested = line.quantity,
                available = stock.quantity,
                "not enough stock"
            );
            shortfalls.push(Shortfall {
                product_id: line.product_id,
                available: stock.quantity,
            });
            continue;
        }

        tracing::debug!(product_id = %line.product_id, quantity = line.quantity, "reserving");
        tx.write(&stock.with_quantity(remaining)).await?;
    }

    if shortfalls.is_empty() {
        Ok(ReservationOutcome::Reserved)
    } else {
        Ok(ReservationOutcome::InsufficientStock(shortfalls))
    }
}

//! Versioned stock records.
//!
//! One record per product holds its available quantity and a version
//! counter. Writes are conditional on the version the writer read
//! (optimistic concurrency); multi-record updates go through a
//! [`StockTransaction`] that applies all of its writes or none.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod stock;
pub mod store;

pub use common::ProductId;
pub use error::{Result, StockStoreError};
pub use memory::{InMemoryStockStore, InMemoryStockTransaction};
pub use postgres::{PostgresStockStore, PostgresStockTransaction};
pub use stock::{Stock, Version};
pub use store::{StockStore, StockTransaction};

//! Order service for the ordering side of the system.
//!
//! Creating an order is a single synchronous call to the stock service's
//! reservation endpoint followed by a write to the order repository. Nothing
//! is written when the reservation is rejected, and nothing is compensated
//! when the write fails after a successful reservation.

pub mod client;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod repository;
pub mod service;

pub use client::{
    HttpStockClient, InMemoryStockClient, ReservationReply, ScriptedReply, StockClient,
};
pub use error::{OrderError, OrderRepositoryError, StockClientError};
pub use memory::InMemoryOrderRepository;
pub use order::Order;
pub use postgres::PostgresOrderRepository;
pub use repository::OrderRepository;
pub use service::OrderService;

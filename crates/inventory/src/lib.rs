//! Stock service for the inventory side of the system.
//!
//! This crate provides:
//! - product lifecycle (create, look up, remove)
//! - batch reservations that decrement several products all-or-nothing
//! - restocking a single product with optimistic conflict detection

pub mod error;
pub mod reservation;
pub mod service;

pub use error::StockError;
pub use reservation::{ReservationLine, ReservationOutcome, Shortfall};
pub use service::StockService;
pub use stock_store::{Stock, Version};

//! HTTP handlers of both services.

pub mod ops;
pub mod orders;
pub mod stock;

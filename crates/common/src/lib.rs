//! Shared types for the stock and order services.

pub mod context;
pub mod types;
pub mod wire;

pub use context::{REQUEST_ID_HEADER, RequestContext, RequestId};
pub use types::{OrderId, ProductId};

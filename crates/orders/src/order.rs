use chrono::{DateTime, Utc};
use common::{OrderId, wire::StockLine};
use serde::{Deserialize, Serialize};

/// A recorded order.
///
/// Orders only exist for reservations that succeeded; the lines are exactly
/// the ones that were reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<StockLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with a fresh id, stamped now.
    pub fn new(lines: Vec<StockLine>) -> Self {
        Self {
            id: OrderId::new(),
            lines,
            created_at: Utc::now(),
        }
    }
}

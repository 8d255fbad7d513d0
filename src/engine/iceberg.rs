//! Iceberg-parent bookkeeping: tracks the hidden reserve behind the
//! currently displayed child order.

use super::order::{Order, OrderId, Qty};

/// State the engine keeps for an iceberg order beyond what's visible in the
/// book, which only ever sees the current child as an ordinary LIMIT.
#[derive(Debug, Clone)]
pub struct IcebergParent {
    /// The original order as submitted (price/side/total/display/trader).
    pub parent: Order,
    pub hidden_remaining: Qty,
    pub active_child_id: Option<OrderId>,
}

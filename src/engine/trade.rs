//! Executed trade records.

use serde::{Deserialize, Serialize};

use super::order::{Cash, OrderId, Price, Qty, Side, Symbol};

/// A single execution between a taker and a maker order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: u64,
    pub symbol: Symbol,
    pub price: Price,
    pub quantity: Qty,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub taker_side: Side,
    pub timestamp: i64,
    pub maker_fee: Cash,
    pub taker_fee: Cash,
}

//! Commonly used types and traits, re-exported for a single `use` line.

pub use crate::engine::{
    BookDepth, Cash, DepthLevel, EngineError, Event, EventBus, FeeSchedule, MatchingEngine,
    MatchingStrategy, Order, OrderBook, OrderBookError, OrderId, OrderKind, PnlReport, Price, Qty,
    RiskConfig, RiskRule, Side, SubmitReceipt, Symbol, TimeInForce, Trade, Trader, TraderId,
};
pub use crate::utils::current_time_millis;

//! # simex-core
//!
//! A single-threaded, cooperative limit order book and matching engine core
//! for an algorithmic trading simulator.
//!
//! ## Key features
//!
//! - Price-time priority matching with O(log n) insertion and O(1) amortized
//!   top-of-book access via lazy deletion (canceled orders are tombstoned,
//!   not eagerly removed from the priority heap).
//! - An optional pro-rata allocation mode at the top maker price level.
//! - LIMIT, MARKET, STOP_LOSS, STOP_LIMIT, TRAILING_STOP, and ICEBERG order
//!   types, all routed through a single `submit_order` entry point.
//! - Per-trader cash, weighted-average-cost position tracking, realized and
//!   unrealized P&L, and configurable risk limits evaluated before an order
//!   ever touches a book.
//! - A panic-isolated publish/subscribe event bus for `order_added`,
//!   `order_removed`, and `trade_executed`, meant to feed an external
//!   candle aggregator, HTTP layer, or bot scheduler — none of which live in
//!   this crate.
//!
//! ## What this crate is not
//!
//! It is not a concurrent or lock-free engine: `MatchingEngine` exposes
//! `&mut self` and owns its state outright, so the type system enforces the
//! "one submission runs to completion before the next begins" rule the
//! matching semantics assume. Callers needing concurrent access wrap a
//! `MatchingEngine` behind a lock, a single worker thread with an inbox, or
//! similar; that wrapping is deliberately out of scope here.
//!
//! ## Example
//!
//! ```
//! use simex_core::prelude::*;
//!
//! let mut engine = MatchingEngine::new(MatchingStrategy::Fifo, FeeSchedule::zero_fee());
//! engine.add_order_book("AAPL");
//! engine.register_trader(Trader::new("A", 1_000_000, RiskConfig::default()));
//! engine.register_trader(Trader::new("B", 1_000_000, RiskConfig::default()));
//!
//! let sell = Order::new_limit(OrderId::new_v4(), "AAPL", "B", Side::Sell, 100, 5, TimeInForce::Gtc, 0).unwrap();
//! engine.submit_order(sell).unwrap();
//!
//! let buy = Order::new_limit(OrderId::new_v4(), "AAPL", "A", Side::Buy, 101, 3, TimeInForce::Gtc, 1).unwrap();
//! let receipt = engine.submit_order(buy).unwrap();
//! assert_eq!(receipt.remaining_quantity, 0);
//! assert_eq!(engine.trades().len(), 1);
//! ```

pub mod engine;
pub mod prelude;
mod utils;

pub use engine::{
    BookDepth, Cash, DepthLevel, EngineError, Event, EventBus, FeeSchedule, MatchingEngine,
    MatchingStrategy, Order, OrderBook, OrderBookError, OrderId, OrderKind, PnlReport, Price, Qty,
    RiskConfig, RiskRule, Side, SubmitReceipt, Symbol, TimeInForce, Trade, Trader, TraderId,
};
pub use utils::current_time_millis;

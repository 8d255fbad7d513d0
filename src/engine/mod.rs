//! The order book and matching engine: a single-threaded, cooperative core
//! for price-time and pro-rata priority matching.

mod book;
mod error;
mod events;
mod fees;
mod iceberg;
mod matching;
mod order;
mod stops;
mod trade;
mod trader;

pub use book::{BookDepth, DepthLevel, OrderBook};
pub use error::{EngineError, OrderBookError, RiskRule};
pub use events::{Event, EventBus};
pub use fees::FeeSchedule;
pub use matching::{MatchingEngine, MatchingStrategy, SubmitReceipt};
pub use order::{Cash, Order, OrderId, OrderKind, Price, Qty, Side, Symbol, TimeInForce, TraderId};
pub use trade::Trade;
pub use trader::{PnlReport, RiskConfig, Trader};

//! Error taxonomy for the order book and matching engine.

use thiserror::Error;

use super::order::{OrderId, OrderKind, Symbol, TraderId};

/// Errors raised by [`crate::engine::book::OrderBook`] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrderBookError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("symbol mismatch: order symbol {order_symbol} does not match book symbol {book_symbol}")]
    SymbolMismatch {
        order_symbol: Symbol,
        book_symbol: Symbol,
    },

    #[error("order type {0:?} cannot be inserted directly into an order book")]
    UnsupportedOrderType(OrderKind),

    #[error("order {0} not found")]
    NotFound(OrderId),
}

/// A risk rule that rejected an order, carried so callers can branch on the
/// reason rather than parsing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RiskRule {
    #[error("order notional exceeds the trader's max_order_notional")]
    NotionalCap,
    #[error("order notional exceeds risk_per_trade_fraction of equity")]
    RiskPerTradeFraction,
    #[error("buyer has insufficient balance to cover the order notional")]
    InsufficientBalance,
    #[error("projected position would exceed max_exposure_per_symbol")]
    ExposureCap,
}

/// Errors raised by [`crate::engine::matching::MatchingEngine`] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Book(#[from] OrderBookError),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(Symbol),

    #[error("unknown trader: {0}")]
    UnknownTrader(TraderId),

    #[error("risk check failed: {rule}")]
    RiskRejected { rule: RiskRule },

    #[error("market order for {symbol} could not be matched: opposite side is empty")]
    UnmatchableMarket { symbol: Symbol },
}

//! Order identity, static attributes, and construction-time validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::OrderBookError;

/// Unique identity of an order within an engine run.
pub type OrderId = Uuid;
/// Identity of a registered [`crate::engine::trader::Trader`].
pub type TraderId = String;
/// Instrument identity, e.g. `"AAPL"`.
pub type Symbol = String;

/// Fixed-point price, scaled by a tick resolution the caller defines.
pub type Price = u128;
/// Fixed-point quantity.
pub type Qty = u64;
/// Fixed-point cash / realized P&L / fee amount, signed.
pub type Cash = i128;

/// The side of a book (or a fill, or a position) an order sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Resting-order lifetime policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-till-canceled: rests until filled or explicitly canceled.
    Gtc,
    /// Immediate-or-cancel: any residual after the match loop is tombstoned.
    Ioc,
}

/// The kind of order, carrying the fields relevant to that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
    StopLoss,
    StopLimit,
    TrailingStop,
    Iceberg,
}

/// An order submitted to the engine.
///
/// `remaining_quantity` is the only field that changes after construction; it
/// is monotonically non-increasing and reaches zero exactly when the order is
/// fully filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub trader_id: TraderId,
    pub side: Side,
    pub kind: OrderKind,
    /// LIMIT / ICEBERG resting price. `None` for MARKET and for untriggered
    /// STOP_* orders (those carry their trigger in `stop_price`/`limit_price`).
    pub price: Option<Price>,
    pub stop_price: Option<Price>,
    pub limit_price: Option<Price>,
    pub trailing_offset: Option<Price>,
    pub quantity: Qty,
    pub remaining_quantity: Qty,
    pub display_quantity: Option<Qty>,
    pub total_quantity: Option<Qty>,
    pub tif: TimeInForce,
    pub timestamp: i64,
    pub sequence_number: Option<u64>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    fn base(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        kind: OrderKind,
        quantity: Qty,
        tif: TimeInForce,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        if quantity == 0 {
            return Err(OrderBookError::InvalidOrder(
                "quantity must be positive".into(),
            ));
        }
        Ok(Order {
            id,
            symbol: symbol.into(),
            trader_id: trader_id.into(),
            side,
            kind,
            price: None,
            stop_price: None,
            limit_price: None,
            trailing_offset: None,
            quantity,
            remaining_quantity: quantity,
            display_quantity: None,
            total_quantity: None,
            tif,
            timestamp,
            sequence_number: None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_limit(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        price: Price,
        quantity: Qty,
        tif: TimeInForce,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        if price == 0 {
            return Err(OrderBookError::InvalidOrder(
                "limit price must be positive".into(),
            ));
        }
        let mut order = Order::base(
            id,
            symbol,
            trader_id,
            side,
            OrderKind::Limit,
            quantity,
            tif,
            timestamp,
        )?;
        order.price = Some(price);
        Ok(order)
    }

    pub fn new_market(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        quantity: Qty,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        // MARKET orders never rest, so their time-in-force is degenerate; IOC
        // reflects that most directly.
        Order::base(
            id,
            symbol,
            trader_id,
            side,
            OrderKind::Market,
            quantity,
            TimeInForce::Ioc,
            timestamp,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_stop_loss(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        stop_price: Price,
        quantity: Qty,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        if stop_price == 0 {
            return Err(OrderBookError::InvalidOrder(
                "stop price must be positive".into(),
            ));
        }
        let mut order = Order::base(
            id,
            symbol,
            trader_id,
            side,
            OrderKind::StopLoss,
            quantity,
            TimeInForce::Gtc,
            timestamp,
        )?;
        order.stop_price = Some(stop_price);
        Ok(order)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_stop_limit(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        stop_price: Price,
        limit_price: Price,
        quantity: Qty,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        if stop_price == 0 || limit_price == 0 {
            return Err(OrderBookError::InvalidOrder(
                "stop and limit price must be positive".into(),
            ));
        }
        let mut order = Order::base(
            id,
            symbol,
            trader_id,
            side,
            OrderKind::StopLimit,
            quantity,
            TimeInForce::Gtc,
            timestamp,
        )?;
        order.stop_price = Some(stop_price);
        order.limit_price = Some(limit_price);
        Ok(order)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_trailing_stop(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        trailing_offset: Price,
        quantity: Qty,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        if trailing_offset == 0 {
            return Err(OrderBookError::InvalidOrder(
                "trailing offset must be positive".into(),
            ));
        }
        let mut order = Order::base(
            id,
            symbol,
            trader_id,
            side,
            OrderKind::TrailingStop,
            quantity,
            TimeInForce::Gtc,
            timestamp,
        )?;
        order.trailing_offset = Some(trailing_offset);
        Ok(order)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_iceberg(
        id: OrderId,
        symbol: impl Into<Symbol>,
        trader_id: impl Into<TraderId>,
        side: Side,
        price: Price,
        display_quantity: Qty,
        total_quantity: Qty,
        tif: TimeInForce,
        timestamp: i64,
    ) -> Result<Order, OrderBookError> {
        if price == 0 {
            return Err(OrderBookError::InvalidOrder(
                "iceberg price must be positive".into(),
            ));
        }
        if display_quantity == 0 || display_quantity > total_quantity {
            return Err(OrderBookError::InvalidOrder(
                "iceberg display_quantity must be positive and at most total_quantity".into(),
            ));
        }
        let mut order = Order::base(
            id,
            symbol,
            trader_id,
            side,
            OrderKind::Iceberg,
            total_quantity,
            tif,
            timestamp,
        )?;
        order.price = Some(price);
        order.display_quantity = Some(display_quantity);
        order.total_quantity = Some(total_quantity);
        Ok(order)
    }

    /// Returns the effective price used for cross-type priority comparisons:
    /// the limit price for LIMIT/ICEBERG, `+inf` for a MARKET buy, `0` for a
    /// MARKET sell.
    #[must_use]
    pub fn effective_price(&self) -> i128 {
        match (self.kind, self.side) {
            (OrderKind::Market, Side::Buy) => i128::MAX,
            (OrderKind::Market, Side::Sell) => 0,
            _ => self.price.unwrap_or(0) as i128,
        }
    }
}

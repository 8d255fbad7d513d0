//! Per-symbol limit order book: two priority structures with lazy deletion
//! plus an id index that is the single source of truth for liveness.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::trace;

use super::error::OrderBookError;
use super::order::{Order, OrderId, OrderKind, Price, Qty, Side, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Key {
    effective_price: i128,
    timestamp: i64,
    sequence: u64,
    order_id: OrderId,
}

/// Bid priority: higher price first, then earlier timestamp, then earlier
/// sequence. `BinaryHeap` pops the maximum, so "better" must compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BidKey(Key);

impl Ord for BidKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .effective_price
            .cmp(&other.0.effective_price)
            .then_with(|| other.0.timestamp.cmp(&self.0.timestamp))
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

impl PartialOrd for BidKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ask priority: lower price first, then earlier timestamp, then earlier
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AskKey(Key);

impl Ord for AskKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .effective_price
            .cmp(&self.0.effective_price)
            .then_with(|| other.0.timestamp.cmp(&self.0.timestamp))
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

impl PartialOrd for AskKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One aggregated price level in a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: Qty,
}

/// Top-N depth on both sides of a book.
#[derive(Debug, Clone, Default)]
pub struct BookDepth {
    /// Highest price first.
    pub bids: Vec<DepthLevel>,
    /// Lowest price first.
    pub asks: Vec<DepthLevel>,
}

/// A single-instrument order book.
///
/// Orders rejected by [`OrderBook::add`] (advanced types not meant to rest
/// directly) are the matching engine's job to route elsewhere; this type only
/// understands LIMIT and MARKET.
#[derive(Debug)]
pub struct OrderBook {
    pub symbol: Symbol,
    bids: BinaryHeap<BidKey>,
    asks: BinaryHeap<AskKey>,
    orders_by_id: HashMap<OrderId, Order>,
    next_sequence: u64,
}

impl OrderBook {
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BinaryHeap::new(),
            asks: BinaryHeap::new(),
            orders_by_id: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Inserts an order into the book, assigning its `sequence_number`.
    ///
    /// # Errors
    /// `SymbolMismatch` if `order.symbol` differs from this book's symbol;
    /// `UnsupportedOrderType` for STOP_*, TRAILING_STOP, or a raw ICEBERG
    /// parent (the engine slices those before they reach a book).
    pub fn add(&mut self, mut order: Order) -> Result<OrderId, OrderBookError> {
        if order.symbol != self.symbol {
            return Err(OrderBookError::SymbolMismatch {
                order_symbol: order.symbol,
                book_symbol: self.symbol.clone(),
            });
        }
        match order.kind {
            OrderKind::Limit | OrderKind::Market => {}
            other => return Err(OrderBookError::UnsupportedOrderType(other)),
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        order.sequence_number = Some(sequence);

        let key = Key {
            effective_price: order.effective_price(),
            timestamp: order.timestamp,
            sequence,
            order_id: order.id,
        };
        match order.side {
            Side::Buy => self.bids.push(BidKey(key)),
            Side::Sell => self.asks.push(AskKey(key)),
        }
        trace!(
            order_id = %order.id,
            symbol = %self.symbol,
            side = ?order.side,
            price = ?order.price,
            quantity = order.remaining_quantity,
            "order added to book"
        );
        let id = order.id;
        self.orders_by_id.insert(id, order);
        Ok(id)
    }

    /// Removes a live order, returning it. Idempotent at the engine layer:
    /// callers that treat `NotFound` as a no-op get cancel idempotence.
    pub fn remove(&mut self, id: OrderId) -> Result<Order, OrderBookError> {
        self.orders_by_id.remove(&id).ok_or(OrderBookError::NotFound(id))
    }

    #[must_use]
    pub fn contains(&self, id: OrderId) -> bool {
        self.orders_by_id.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders_by_id.get(&id)
    }

    /// Sets an order's remaining quantity, removing it if it reaches zero.
    /// Returns `true` if the order was removed.
    pub(crate) fn sync_remaining(&mut self, id: OrderId, new_remaining: Qty) -> bool {
        if new_remaining == 0 {
            self.orders_by_id.remove(&id);
            true
        } else if let Some(order) = self.orders_by_id.get_mut(&id) {
            order.remaining_quantity = new_remaining;
            false
        } else {
            false
        }
    }

    /// Cleans tombstones from the top of `side`'s heap and returns the live
    /// top id, if any. O(1) amortized: each tombstone is popped once ever.
    pub(crate) fn top_id(&mut self, side: Side) -> Option<OrderId> {
        match side {
            Side::Buy => loop {
                let top = self.bids.peek()?.0;
                if self.orders_by_id.contains_key(&top.order_id) {
                    return Some(top.order_id);
                }
                self.bids.pop();
            },
            Side::Sell => loop {
                let top = self.asks.peek()?.0;
                if self.orders_by_id.contains_key(&top.order_id) {
                    return Some(top.order_id);
                }
                self.asks.pop();
            },
        }
    }

    /// The live top-of-book order on `side`, if any.
    #[must_use]
    pub fn peek_best(&mut self, side: Side) -> Option<Order> {
        let id = self.top_id(side)?;
        self.orders_by_id.get(&id).cloned()
    }

    #[must_use]
    pub fn best_bid(&mut self) -> Option<Order> {
        self.peek_best(Side::Buy)
    }

    #[must_use]
    pub fn best_ask(&mut self) -> Option<Order> {
        self.peek_best(Side::Sell)
    }

    /// All live orders on `side` at exactly `price`, in priority order
    /// (earliest `(timestamp, sequence_number)` first). Used by pro-rata
    /// allocation, not the hot FIFO path, so a direct index scan is fine.
    #[must_use]
    pub fn live_orders_at(&self, side: Side, price: Price) -> Vec<Order> {
        let mut matches: Vec<Order> = self
            .orders_by_id
            .values()
            .filter(|o| o.side == side && o.remaining_quantity > 0 && o.price == Some(price))
            .cloned()
            .collect();
        matches.sort_by_key(|o| (o.timestamp, o.sequence_number.unwrap_or(u64::MAX)));
        matches
    }

    /// Aggregates live resting quantity by price, up to `levels` distinct
    /// prices on each side.
    #[must_use]
    pub fn depth(&self, levels: usize) -> BookDepth {
        let mut bid_totals: HashMap<Price, Qty> = HashMap::new();
        let mut ask_totals: HashMap<Price, Qty> = HashMap::new();
        for order in self.orders_by_id.values() {
            let Some(price) = order.price else { continue };
            match order.side {
                Side::Buy => *bid_totals.entry(price).or_insert(0) += order.remaining_quantity,
                Side::Sell => *ask_totals.entry(price).or_insert(0) += order.remaining_quantity,
            }
        }
        let mut bids: Vec<DepthLevel> = bid_totals
            .into_iter()
            .map(|(price, quantity)| DepthLevel { price, quantity })
            .collect();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        bids.truncate(levels);

        let mut asks: Vec<DepthLevel> = ask_totals
            .into_iter()
            .map(|(price, quantity)| DepthLevel { price, quantity })
            .collect();
        asks.sort_by_key(|level| level.price);
        asks.truncate(levels);

        BookDepth { bids, asks }
    }

    /// Marks every live order belonging to `trader_id` as removed, returning
    /// the count removed.
    pub fn cancel_all(&mut self, trader_id: &str) -> usize {
        let before = self.orders_by_id.len();
        self.orders_by_id.retain(|_, o| o.trader_id != trader_id);
        before - self.orders_by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders_by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::order::TimeInForce;
    use uuid::Uuid;

    fn limit(side: Side, price: Price, qty: Qty, ts: i64) -> Order {
        Order::new_limit(Uuid::new_v4(), "AAPL", "T", side, price, qty, TimeInForce::Gtc, ts).unwrap()
    }

    #[test]
    fn price_priority_then_time_priority() {
        let mut book = OrderBook::new("AAPL");
        let a1 = limit(Side::Sell, 100, 1, 1);
        let a1_id = a1.id;
        let a2 = limit(Side::Sell, 100, 1, 2);
        book.add(a1).unwrap();
        book.add(a2).unwrap();
        assert_eq!(book.best_ask().unwrap().id, a1_id);
    }

    #[test]
    fn lazy_deletion_skips_canceled_top() {
        let mut book = OrderBook::new("AAPL");
        let a1 = limit(Side::Sell, 99, 1, 1);
        let a1_id = a1.id;
        let a2 = limit(Side::Sell, 100, 1, 2);
        let a2_id = a2.id;
        book.add(a1).unwrap();
        book.add(a2).unwrap();
        book.remove(a1_id).unwrap();
        assert_eq!(book.best_ask().unwrap().id, a2_id);
    }

    #[test]
    fn symbol_mismatch_rejected() {
        let mut book = OrderBook::new("AAPL");
        let mut bad = limit(Side::Buy, 100, 1, 1);
        bad.symbol = "MSFT".into();
        let err = book.add(bad).unwrap_err();
        assert!(matches!(err, OrderBookError::SymbolMismatch { .. }));
    }

    #[test]
    fn depth_aggregates_by_price() {
        let mut book = OrderBook::new("AAPL");
        book.add(limit(Side::Buy, 100, 3, 1)).unwrap();
        book.add(limit(Side::Buy, 100, 2, 2)).unwrap();
        book.add(limit(Side::Buy, 99, 5, 3)).unwrap();
        let depth = book.depth(10);
        assert_eq!(depth.bids[0], DepthLevel { price: 100, quantity: 5 });
        assert_eq!(depth.bids[1], DepthLevel { price: 99, quantity: 5 });
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut book = OrderBook::new("AAPL");
        let id = book.add(limit(Side::Buy, 100, 1, 1)).unwrap();
        book.remove(id).unwrap();
        assert!(matches!(book.remove(id), Err(OrderBookError::NotFound(_))));
    }
}

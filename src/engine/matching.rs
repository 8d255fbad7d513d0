//! Entry point for all order submissions: risk gating, routing, the match
//! loop, settlement, stop activation, and iceberg replenishment.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::book::{BookDepth, OrderBook};
use super::error::{EngineError, OrderBookError, RiskRule};
use super::events::{Event, EventBus};
use super::fees::FeeSchedule;
use super::iceberg::IcebergParent;
use super::order::{Cash, Order, OrderId, OrderKind, Price, Qty, Side, Symbol, TraderId};
use super::stops::StopOrder;
use super::trade::Trade;
use super::trader::{PnlReport, Trader};
use crate::utils::{current_time_millis, SequenceGenerator};

/// How liquidity at the top maker price level is allocated across makers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingStrategy {
    #[default]
    Fifo,
    ProRata,
}

/// Outcome of a single `submit_order` call.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// The caller-visible id: for ICEBERG this is the parent id, not the
    /// currently displayed child's id.
    pub order_id: OrderId,
    pub remaining_quantity: Qty,
    pub resting: bool,
}

/// The matching engine: owns every book and trader it's given, and is the
/// sole entry point that mutates them.
#[derive(Debug)]
pub struct MatchingEngine {
    order_books: HashMap<Symbol, OrderBook>,
    traders: HashMap<TraderId, Trader>,
    trades: Vec<Trade>,
    last_trade_price: HashMap<Symbol, Price>,
    stop_orders: Vec<StopOrder>,
    iceberg_parents: HashMap<OrderId, IcebergParent>,
    matching_strategy: MatchingStrategy,
    fee_schedule: FeeSchedule,
    events: EventBus,
    trade_sequence: SequenceGenerator,
}

impl MatchingEngine {
    #[must_use]
    pub fn new(matching_strategy: MatchingStrategy, fee_schedule: FeeSchedule) -> Self {
        Self {
            order_books: HashMap::new(),
            traders: HashMap::new(),
            trades: Vec::new(),
            last_trade_price: HashMap::new(),
            stop_orders: Vec::new(),
            iceberg_parents: HashMap::new(),
            matching_strategy,
            fee_schedule,
            events: EventBus::new(),
            trade_sequence: SequenceGenerator::new(),
        }
    }

    pub fn add_order_book(&mut self, symbol: impl Into<Symbol>) {
        let symbol = symbol.into();
        info!(symbol = %symbol, "registering order book");
        self.order_books.entry(symbol.clone()).or_insert_with(|| OrderBook::new(symbol));
    }

    pub fn register_trader(&mut self, trader: Trader) {
        debug!(trader_id = %trader.id, "registering trader");
        self.traders.insert(trader.id.clone(), trader);
    }

    pub fn subscribe(&mut self, event: impl Into<String>, handler: Arc<dyn Fn(&Event) + Send + Sync>) {
        self.events.subscribe(event, handler);
    }

    #[must_use]
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn depth(&self, symbol: &str, levels: usize) -> Result<BookDepth, EngineError> {
        self.order_books
            .get(symbol)
            .map(|b| b.depth(levels))
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    pub fn pnl_report(&self, trader_id: &str) -> Result<PnlReport, EngineError> {
        self.traders
            .get(trader_id)
            .map(Trader::pnl_report)
            .ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))
    }

    pub fn position_report(&self, trader_id: &str) -> Result<HashMap<Symbol, i64>, EngineError> {
        self.traders
            .get(trader_id)
            .map(Trader::position_report)
            .ok_or_else(|| EngineError::UnknownTrader(trader_id.to_string()))
    }

    #[must_use]
    pub fn trader(&self, trader_id: &str) -> Option<&Trader> {
        self.traders.get(trader_id)
    }

    fn book_mut(&mut self, symbol: &str) -> Result<&mut OrderBook, EngineError> {
        self.order_books
            .get_mut(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    /// Submits an order. Runs the match loop (if applicable), then loops
    /// match → activate-stops → match until convergence, bounded by the
    /// number of stops pending at entry.
    pub fn submit_order(&mut self, order: Order) -> Result<SubmitReceipt, EngineError> {
        let symbol = order.symbol.clone();
        let receipt = self.submit_order_internal(order)?;

        let bound = self.stop_orders.len() + 1;
        let mut converged = false;
        for _ in 0..bound {
            let triggered = self.collect_triggered_stops(&symbol);
            if triggered.is_empty() {
                converged = true;
                break;
            }
            for stop_order in triggered {
                self.submit_order_internal(stop_order)?;
            }
        }
        if !converged && self.has_pending_trigger(&symbol) {
            warn!(symbol = %symbol, "stop activation did not converge within bound; deferring remainder");
        }
        Ok(receipt)
    }

    fn submit_order_internal(&mut self, order: Order) -> Result<SubmitReceipt, EngineError> {
        if !self.order_books.contains_key(&order.symbol) {
            return Err(EngineError::UnknownSymbol(order.symbol.clone()));
        }
        self.risk_check(&order)?;
        {
            let trader = self
                .traders
                .get_mut(&order.trader_id)
                .ok_or_else(|| EngineError::UnknownTrader(order.trader_id.clone()))?;
            trader.order_history.push(order.clone());
        }
        match order.kind {
            OrderKind::StopLoss | OrderKind::StopLimit | OrderKind::TrailingStop => {
                let id = order.id;
                let remaining = order.remaining_quantity;
                self.stop_orders.push(StopOrder::new(order));
                Ok(SubmitReceipt {
                    order_id: id,
                    remaining_quantity: remaining,
                    resting: false,
                })
            }
            OrderKind::Iceberg => self.submit_iceberg(order),
            OrderKind::Limit => self.place_limit_and_match(order),
            OrderKind::Market => self.submit_market(order),
        }
    }

    fn submit_iceberg(&mut self, order: Order) -> Result<SubmitReceipt, EngineError> {
        let display = order
            .display_quantity
            .ok_or_else(|| EngineError::Book(OrderBookError::InvalidOrder("iceberg missing display_quantity".into())))?;
        let total = order
            .total_quantity
            .ok_or_else(|| EngineError::Book(OrderBookError::InvalidOrder("iceberg missing total_quantity".into())))?;
        let price = order
            .price
            .ok_or_else(|| EngineError::Book(OrderBookError::InvalidOrder("iceberg missing price".into())))?;
        let child_qty = display.min(total);
        let hidden_remaining = total - child_qty;
        let parent_id = order.id;

        let child = Order::new_limit(
            Uuid::new_v4(),
            order.symbol.clone(),
            order.trader_id.clone(),
            order.side,
            price,
            child_qty,
            order.tif,
            order.timestamp,
        )?;
        self.iceberg_parents.insert(
            parent_id,
            IcebergParent {
                parent: order,
                hidden_remaining,
                active_child_id: Some(child.id),
            },
        );
        let receipt = self.submit_order_internal(child)?;
        Ok(SubmitReceipt {
            order_id: parent_id,
            ..receipt
        })
    }

    fn place_limit_and_match(&mut self, order: Order) -> Result<SubmitReceipt, EngineError> {
        let symbol = order.symbol.clone();
        let id = order.id;
        let tif = order.tif;
        self.book_mut(&symbol)?.add(order)?;
        let mut taker = self
            .book_mut(&symbol)?
            .get(id)
            .cloned()
            .expect("order just inserted must be present");
        self.events.publish(&Event::OrderAdded(taker.clone()));
        self.run_match_loop(&mut taker)?;

        if tif == super::order::TimeInForce::Ioc && taker.remaining_quantity > 0 {
            if self.book_mut(&symbol)?.remove(id).is_ok() {
                self.events.publish(&Event::OrderRemoved(id));
            }
        }
        Ok(SubmitReceipt {
            order_id: id,
            remaining_quantity: taker.remaining_quantity,
            resting: self.book_mut(&symbol)?.contains(id),
        })
    }

    fn submit_market(&mut self, mut order: Order) -> Result<SubmitReceipt, EngineError> {
        let symbol = order.symbol.clone();
        let opposite = order.side.opposite();
        if self.book_mut(&symbol)?.peek_best(opposite).is_none() {
            return Err(EngineError::UnmatchableMarket { symbol });
        }
        self.run_match_loop(&mut order)?;
        Ok(SubmitReceipt {
            order_id: order.id,
            remaining_quantity: order.remaining_quantity,
            resting: false,
        })
    }

    /// Repeatedly matches `taker` against the opposite side's top of book
    /// while crossed, for as long as `taker` has remaining quantity.
    fn run_match_loop(&mut self, taker: &mut Order) -> Result<(), EngineError> {
        let symbol = taker.symbol.clone();
        loop {
            if taker.remaining_quantity == 0 {
                break;
            }
            let maker_side = taker.side.opposite();
            let Some(maker_id) = self.book_mut(&symbol)?.top_id(maker_side) else {
                break;
            };
            let maker_price = self
                .book_mut(&symbol)?
                .get(maker_id)
                .and_then(|o| o.price)
                .expect("resting maker always carries a concrete price") as i128;
            let taker_price = taker.effective_price();
            let crossed = match taker.side {
                Side::Buy => taker_price >= maker_price,
                Side::Sell => taker_price <= maker_price,
            };
            if !crossed {
                break;
            }

            if self.matching_strategy == MatchingStrategy::ProRata && taker.kind != OrderKind::Market {
                self.execute_pro_rata_level(taker, maker_price as Price)?;
            } else {
                self.execute_single_fifo_fill(taker, maker_id)?;
            }
        }
        Ok(())
    }

    fn execute_single_fifo_fill(&mut self, taker: &mut Order, maker_id: OrderId) -> Result<(), EngineError> {
        let symbol = taker.symbol.clone();
        let maker = self
            .book_mut(&symbol)?
            .get(maker_id)
            .cloned()
            .expect("maker id came from a live top_id lookup");
        let fill_qty = taker.remaining_quantity.min(maker.remaining_quantity);
        let price = maker.price.expect("maker is always a resting limit order");
        self.apply_fill(taker, &maker, fill_qty, price)
    }

    /// Allocates the aggressor's quantity across every live maker at
    /// `maker_price`, proportional to remaining size, residue to the
    /// earliest-priority maker.
    fn execute_pro_rata_level(&mut self, taker: &mut Order, maker_price: Price) -> Result<(), EngineError> {
        let symbol = taker.symbol.clone();
        let maker_side = taker.side.opposite();
        let makers = self.book_mut(&symbol)?.live_orders_at(maker_side, maker_price);
        if makers.is_empty() {
            return Ok(());
        }
        let total_resting: u128 = makers.iter().map(|m| m.remaining_quantity as u128).sum();
        let want = (taker.remaining_quantity as u128).min(total_resting);
        if want == 0 || total_resting == 0 {
            return Ok(());
        }

        let mut allocations: Vec<Qty> = makers
            .iter()
            .map(|m| ((want * m.remaining_quantity as u128) / total_resting) as Qty)
            .collect();
        let allocated_sum: u128 = allocations.iter().map(|&q| q as u128).sum();
        let residue = (want - allocated_sum) as Qty;
        if let Some(first) = allocations.first_mut() {
            *first += residue;
        }

        for (maker, qty) in makers.iter().zip(allocations.into_iter()) {
            if qty == 0 {
                continue;
            }
            self.apply_fill(taker, maker, qty, maker_price)?;
            if taker.remaining_quantity == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Applies one fill: decrements both sides, settles both traders, records
    /// the trade, updates last-trade-price, and publishes events. Does not
    /// run the stop-activation scan; that happens once per `submit_order`
    /// call, after the whole match loop drains.
    fn apply_fill(&mut self, taker: &mut Order, maker: &Order, qty: Qty, price: Price) -> Result<(), EngineError> {
        let symbol = taker.symbol.clone();
        taker.remaining_quantity -= qty;
        let maker_new_remaining = maker.remaining_quantity - qty;

        {
            let book = self.book_mut(&symbol)?;
            book.sync_remaining(taker.id, taker.remaining_quantity);
            let maker_removed = book.sync_remaining(maker.id, maker_new_remaining);
            if maker_removed {
                self.events.publish(&Event::OrderRemoved(maker.id));
                self.maybe_replenish_iceberg(maker.id, &symbol)?;
            }
        }
        if taker.remaining_quantity == 0 {
            self.events.publish(&Event::OrderRemoved(taker.id));
        }

        let notional = price * qty as u128;
        let maker_fee = self.fee_schedule.calculate_fee(notional, true);
        let taker_fee = self.fee_schedule.calculate_fee(notional, false);

        if let Some(trader) = self.traders.get_mut(&maker.trader_id) {
            trader.settle_fill(symbol.clone(), maker.side, qty, price, maker_fee);
            trader.update_mark(symbol.clone(), price);
        }
        if let Some(trader) = self.traders.get_mut(&taker.trader_id) {
            trader.settle_fill(symbol.clone(), taker.side, qty, price, taker_fee);
            trader.update_mark(symbol.clone(), price);
        }

        let trade = Trade {
            trade_id: self.trade_sequence.next(),
            symbol: symbol.clone(),
            price,
            quantity: qty,
            taker_order_id: taker.id,
            maker_order_id: maker.id,
            taker_side: taker.side,
            timestamp: current_time_millis(),
            maker_fee,
            taker_fee,
        };
        debug!(
            trade_id = trade.trade_id,
            symbol = %symbol,
            price,
            quantity = qty,
            "trade executed"
        );
        self.last_trade_price.insert(symbol, price);
        self.events.publish(&Event::TradeExecuted(trade.clone()));
        self.trades.push(trade);
        Ok(())
    }

    fn maybe_replenish_iceberg(&mut self, removed_order_id: OrderId, symbol: &str) -> Result<(), EngineError> {
        let parent_id = self
            .iceberg_parents
            .iter()
            .find(|(_, p)| p.active_child_id == Some(removed_order_id))
            .map(|(id, _)| *id);
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        let (hidden_remaining, display, price, side, trader_id, tif) = {
            let parent = self.iceberg_parents.get(&parent_id).expect("just looked up");
            (
                parent.hidden_remaining,
                parent
                    .parent
                    .display_quantity
                    .expect("iceberg parent always carries display_quantity"),
                parent.parent.price.expect("iceberg parent always carries price"),
                parent.parent.side,
                parent.parent.trader_id.clone(),
                parent.parent.tif,
            )
        };
        if hidden_remaining == 0 {
            self.iceberg_parents.remove(&parent_id);
            return Ok(());
        }
        let next_qty = display.min(hidden_remaining);
        let child = Order::new_limit(
            Uuid::new_v4(),
            symbol,
            trader_id,
            side,
            price,
            next_qty,
            tif,
            current_time_millis(),
        )?;
        let child_id = child.id;
        self.book_mut(symbol)?.add(child)?;
        let stored = self.book_mut(symbol)?.get(child_id).cloned().expect("child just inserted must be present");
        self.events.publish(&Event::OrderAdded(stored));
        let parent = self.iceberg_parents.get_mut(&parent_id).expect("just looked up");
        parent.hidden_remaining -= next_qty;
        parent.active_child_id = Some(child_id);
        Ok(())
    }

    fn collect_triggered_stops(&mut self, symbol: &str) -> Vec<Order> {
        let Some(&last) = self.last_trade_price.get(symbol) else {
            return Vec::new();
        };
        let mut triggered = Vec::new();
        let mut idx = 0;
        while idx < self.stop_orders.len() {
            if self.stop_orders[idx].order.symbol != symbol {
                idx += 1;
                continue;
            }
            if self.stop_orders[idx].check_and_update(last) {
                let stop = self.stop_orders.remove(idx);
                triggered.push(stop.into_triggered_order());
            } else {
                idx += 1;
            }
        }
        triggered
    }

    /// Like `collect_triggered_stops`, but read-only: reports whether any
    /// stop for `symbol` would fire now, without removing it from
    /// `stop_orders` or advancing trailing-stop watermarks. Used only to
    /// decide whether the activation loop's convergence-bound warning is
    /// warranted.
    fn has_pending_trigger(&self, symbol: &str) -> bool {
        let Some(&last) = self.last_trade_price.get(symbol) else {
            return false;
        };
        self.stop_orders
            .iter()
            .any(|s| s.order.symbol == symbol && s.is_ready(last))
    }

    fn estimate_notional(&mut self, order: &Order) -> Option<Cash> {
        let price = match order.kind {
            OrderKind::Market => self.last_trade_price.get(&order.symbol).copied().or_else(|| {
                let opposite = order.side.opposite();
                self.order_books
                    .get_mut(&order.symbol)
                    .and_then(|b| b.peek_best(opposite))
                    .and_then(|o| o.price)
            }),
            _ => order.price.or(order.limit_price),
        };
        price.map(|p| p as i128 * order.quantity as i128)
    }

    fn risk_check(&mut self, order: &Order) -> Result<(), EngineError> {
        let notional = self.estimate_notional(order);
        let Some(trader) = self.traders.get(&order.trader_id) else {
            return Ok(()); // UnknownTrader is reported by the caller right after.
        };

        if let (Some(cap), Some(n)) = (trader.risk.max_order_notional, notional) {
            if n > cap {
                return Err(EngineError::RiskRejected { rule: RiskRule::NotionalCap });
            }
        }
        if let (Some(frac), Some(n)) = (trader.risk.risk_per_trade_fraction, notional) {
            let equity = trader.equity();
            if equity > 0 && (n as f64) > frac * equity as f64 {
                return Err(EngineError::RiskRejected {
                    rule: RiskRule::RiskPerTradeFraction,
                });
            }
        }
        if order.side == Side::Buy {
            if let Some(n) = notional {
                if trader.balance < n {
                    return Err(EngineError::RiskRejected {
                        rule: RiskRule::InsufficientBalance,
                    });
                }
            }
        }
        if let Some(cap) = trader.risk.max_exposure_per_symbol {
            let signed_qty = match order.side {
                Side::Buy => order.quantity as i64,
                Side::Sell => -(order.quantity as i64),
            };
            let projected = (trader.position(&order.symbol) + signed_qty).unsigned_abs();
            if projected > cap {
                return Err(EngineError::RiskRejected { rule: RiskRule::ExposureCap });
            }
        }
        Ok(())
    }

    pub fn cancel_order(&mut self, order_id: OrderId, symbol: Option<&str>) -> Result<(), EngineError> {
        if let Some(parent) = self.iceberg_parents.get(&order_id).cloned() {
            if let Some(child_id) = parent.active_child_id {
                if let Some(book) = self.order_books.get_mut(&parent.parent.symbol) {
                    let _ = book.remove(child_id);
                }
            }
            self.iceberg_parents.remove(&order_id);
            return Ok(());
        }
        if let Some(pos) = self.stop_orders.iter().position(|s| s.order.id == order_id) {
            self.stop_orders.remove(pos);
            return Ok(());
        }
        let resolved_symbol = symbol
            .map(str::to_string)
            .or_else(|| self.find_symbol_for_order(order_id));
        if let Some(sym) = resolved_symbol {
            let book = self.book_mut(&sym)?;
            match book.remove(order_id) {
                Ok(_) => {}
                Err(OrderBookError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn find_symbol_for_order(&self, order_id: OrderId) -> Option<Symbol> {
        self.order_books
            .iter()
            .find(|(_, book)| book.contains(order_id))
            .map(|(symbol, _)| symbol.clone())
    }

    /// Cancels every resting order across every book for `trader_id`,
    /// returning the count removed.
    pub fn cancel_all_for_trader(&mut self, trader_id: &str) -> usize {
        self.order_books.values_mut().map(|book| book.cancel_all(trader_id)).sum()
    }
}

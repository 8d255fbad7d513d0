//! Trader cash, positions, weighted-average cost, and P&L.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::order::{Cash, Order, Price, Qty, Side, Symbol, TraderId};

/// Per-trader risk limits evaluated by the matching engine's risk gate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    pub max_order_notional: Option<Cash>,
    /// Cap on the magnitude of the projected position in a single symbol.
    pub max_exposure_per_symbol: Option<Qty>,
    /// Fraction of equity a single order's notional may not exceed.
    pub risk_per_trade_fraction: Option<f64>,
    /// Reserved: windowed daily-loss enforcement is out of scope; the risk
    /// gate never reads this field.
    pub daily_loss_limit: Option<Cash>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PositionState {
    quantity: i64,
    avg_cost: Price,
    realized_pnl: Cash,
}

/// A registered market participant.
#[derive(Debug)]
pub struct Trader {
    pub id: TraderId,
    pub balance: Cash,
    pub risk: RiskConfig,
    positions: HashMap<Symbol, PositionState>,
    last_mark_price: HashMap<Symbol, Price>,
    /// Every order ever submitted by this trader, in submission order.
    pub order_history: Vec<Order>,
}

/// Snapshot of a trader's profit and loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlReport {
    pub realized: Cash,
    pub unrealized: Cash,
    pub cash: Cash,
    pub equity: Cash,
}

impl Trader {
    #[must_use]
    pub fn new(id: impl Into<TraderId>, balance: Cash, risk: RiskConfig) -> Self {
        Self {
            id: id.into(),
            balance,
            risk,
            positions: HashMap::new(),
            last_mark_price: HashMap::new(),
            order_history: Vec::new(),
        }
    }

    #[must_use]
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).map_or(0, |p| p.quantity)
    }

    #[must_use]
    pub fn avg_cost(&self, symbol: &str) -> Option<Price> {
        self.positions.get(symbol).map(|p| p.avg_cost)
    }

    #[must_use]
    pub fn realized_pnl(&self, symbol: &str) -> Cash {
        self.positions.get(symbol).map_or(0, |p| p.realized_pnl)
    }

    pub fn update_mark(&mut self, symbol: impl Into<Symbol>, price: Price) {
        self.last_mark_price.insert(symbol.into(), price);
    }

    #[must_use]
    pub fn unrealized_pnl(&self, symbol: &str) -> Cash {
        let Some(pos) = self.positions.get(symbol) else {
            return 0;
        };
        let Some(&mark) = self.last_mark_price.get(symbol) else {
            return 0;
        };
        (mark as i128 - pos.avg_cost as i128) * pos.quantity as i128
    }

    #[must_use]
    pub fn total_realized_pnl(&self) -> Cash {
        self.positions.values().map(|p| p.realized_pnl).sum()
    }

    #[must_use]
    pub fn total_unrealized_pnl(&self) -> Cash {
        self.positions
            .keys()
            .map(|symbol| self.unrealized_pnl(symbol))
            .sum()
    }

    #[must_use]
    pub fn equity(&self) -> Cash {
        self.balance + self.total_unrealized_pnl()
    }

    #[must_use]
    pub fn pnl_report(&self) -> PnlReport {
        PnlReport {
            realized: self.total_realized_pnl(),
            unrealized: self.total_unrealized_pnl(),
            cash: self.balance,
            equity: self.equity(),
        }
    }

    #[must_use]
    pub fn position_report(&self) -> HashMap<Symbol, i64> {
        self.positions
            .iter()
            .map(|(symbol, pos)| (symbol.clone(), pos.quantity))
            .collect()
    }

    /// Applies a fill of `qty` at `price` on `side`, debiting/crediting cash
    /// by notional plus `fee` (a negative fee is a rebate) and updating
    /// weighted-average cost / realized P&L per the engine's settlement
    /// model.
    pub fn settle_fill(&mut self, symbol: impl Into<Symbol>, side: Side, qty: Qty, price: Price, fee: Cash) {
        let symbol = symbol.into();
        let notional = price as i128 * qty as i128;
        match side {
            Side::Buy => {
                self.balance -= notional + fee;
                self.apply_buy(&symbol, qty, price);
            }
            Side::Sell => {
                self.balance += notional - fee;
                self.apply_sell(&symbol, qty, price);
            }
        }
    }

    fn apply_buy(&mut self, symbol: &str, qty: Qty, price: Price) {
        let pos = self.positions.entry(symbol.to_string()).or_default();
        if pos.quantity >= 0 {
            let new_qty = pos.quantity as u128 + qty as u128;
            let total_cost = pos.avg_cost as u128 * pos.quantity as u128 + price as u128 * qty as u128;
            pos.avg_cost = if new_qty > 0 { total_cost / new_qty } else { 0 };
            pos.quantity = new_qty as i64;
        } else {
            let short_qty = (-pos.quantity) as u64;
            let cover_qty = qty.min(short_qty);
            pos.realized_pnl += (pos.avg_cost as i128 - price as i128) * cover_qty as i128;
            pos.quantity += cover_qty as i64;
            let leftover = qty - cover_qty;
            if leftover > 0 {
                pos.avg_cost = price;
                pos.quantity = leftover as i64;
            }
        }
        if pos.quantity == 0 {
            self.positions.remove(symbol);
        }
    }

    fn apply_sell(&mut self, symbol: &str, qty: Qty, price: Price) {
        let pos = self.positions.entry(symbol.to_string()).or_default();
        if pos.quantity <= 0 {
            let prior_short = (-pos.quantity) as u128;
            let new_short = prior_short + qty as u128;
            let total_cost = pos.avg_cost as u128 * prior_short + price as u128 * qty as u128;
            pos.avg_cost = if new_short > 0 { total_cost / new_short } else { 0 };
            pos.quantity = -(new_short as i64);
        } else {
            let long_qty = pos.quantity as u64;
            let reduce_qty = qty.min(long_qty);
            pos.realized_pnl += (price as i128 - pos.avg_cost as i128) * reduce_qty as i128;
            pos.quantity -= reduce_qty as i64;
            let leftover = qty - reduce_qty;
            if leftover > 0 {
                pos.avg_cost = price;
                pos.quantity = -(leftover as i64);
            }
        }
        if pos.quantity == 0 {
            self.positions.remove(symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_then_sell_realizes_pnl() {
        let mut trader = Trader::new("A", 10_000, RiskConfig::default());
        trader.settle_fill("AAPL", Side::Buy, 10, 100, 0);
        assert_eq!(trader.position("AAPL"), 10);
        assert_eq!(trader.avg_cost("AAPL"), Some(100));
        trader.settle_fill("AAPL", Side::Sell, 10, 110, 0);
        assert_eq!(trader.position("AAPL"), 0);
        assert_eq!(trader.realized_pnl("AAPL"), 100);
    }

    #[test]
    fn weighted_average_cost_on_adding_to_long() {
        let mut trader = Trader::new("A", 100_000, RiskConfig::default());
        trader.settle_fill("AAPL", Side::Buy, 10, 100, 0);
        trader.settle_fill("AAPL", Side::Buy, 10, 120, 0);
        assert_eq!(trader.position("AAPL"), 20);
        assert_eq!(trader.avg_cost("AAPL"), Some(110));
    }

    #[test]
    fn short_cover_with_residual_flips_to_long() {
        let mut trader = Trader::new("A", 100_000, RiskConfig::default());
        trader.settle_fill("AAPL", Side::Sell, 10, 100, 0);
        assert_eq!(trader.position("AAPL"), -10);
        trader.settle_fill("AAPL", Side::Buy, 15, 90, 0);
        assert_eq!(trader.position("AAPL"), 5);
        assert_eq!(trader.avg_cost("AAPL"), Some(90));
        assert_eq!(trader.realized_pnl("AAPL"), 100);
    }

    #[test]
    fn unrealized_pnl_follows_mark() {
        let mut trader = Trader::new("A", 100_000, RiskConfig::default());
        trader.settle_fill("AAPL", Side::Buy, 10, 100, 0);
        trader.update_mark("AAPL", 105);
        assert_eq!(trader.unrealized_pnl("AAPL"), 50);
    }

    #[test]
    fn fee_debits_balance_on_buy() {
        let mut trader = Trader::new("A", 10_000, RiskConfig::default());
        trader.settle_fill("AAPL", Side::Buy, 10, 100, 5);
        assert_eq!(trader.balance, 10_000 - 1_000 - 5);
    }
}

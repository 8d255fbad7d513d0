//! Pending STOP_LOSS / STOP_LIMIT / TRAILING_STOP bookkeeping.

use super::order::{Order, OrderKind, Price, Side};

/// A stop-type order parked outside any book until its trigger fires.
#[derive(Debug, Clone)]
pub struct StopOrder {
    pub order: Order,
    /// High-water (SELL) or low-water (BUY) mark for TRAILING_STOP, tracked
    /// since submission. Unused for STOP_LOSS/STOP_LIMIT.
    watermark: Option<Price>,
}

impl StopOrder {
    #[must_use]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            watermark: None,
        }
    }

    /// Updates trailing-stop state against the latest trade price and
    /// reports whether the stop fires now.
    pub fn check_and_update(&mut self, last_price: Price) -> bool {
        self.advance_watermark(last_price);
        self.is_ready(last_price)
    }

    /// Advances the trailing-stop high/low-water mark. No-op for
    /// STOP_LOSS/STOP_LIMIT, which carry no watermark.
    fn advance_watermark(&mut self, last_price: Price) {
        if self.order.kind != OrderKind::TrailingStop {
            return;
        }
        let mark = match self.order.side {
            Side::Sell => self.watermark.map_or(last_price, |w| w.max(last_price)),
            Side::Buy => self.watermark.map_or(last_price, |w| w.min(last_price)),
        };
        self.watermark = Some(mark);
    }

    /// Reports whether the stop would fire at `last_price`, without
    /// mutating trailing-stop watermark state. Used to detect stops still
    /// pending at the activation loop's convergence bound, where
    /// `check_and_update`'s side effect of removing/advancing state would
    /// be wrong.
    #[must_use]
    pub fn is_ready(&self, last_price: Price) -> bool {
        match self.order.kind {
            OrderKind::StopLoss | OrderKind::StopLimit => {
                let stop_price = self.order.stop_price.expect("stop order always carries stop_price");
                match self.order.side {
                    Side::Sell => last_price <= stop_price,
                    Side::Buy => last_price >= stop_price,
                }
            }
            OrderKind::TrailingStop => {
                let offset = self
                    .order
                    .trailing_offset
                    .expect("trailing stop always carries trailing_offset");
                let mark = self.watermark.unwrap_or(last_price);
                match self.order.side {
                    Side::Sell => last_price <= mark.saturating_sub(offset),
                    Side::Buy => last_price >= mark.saturating_add(offset),
                }
            }
            _ => false,
        }
    }

    /// Converts a fired stop into the order that re-enters `submit_order`:
    /// STOP_LOSS and TRAILING_STOP become MARKET; STOP_LIMIT becomes LIMIT at
    /// its `limit_price`. The original `order_id` is preserved.
    #[must_use]
    pub fn into_triggered_order(self) -> Order {
        let mut order = self.order;
        order.kind = match order.kind {
            OrderKind::StopLimit => OrderKind::Limit,
            _ => OrderKind::Market,
        };
        if order.kind == OrderKind::Limit {
            order.price = order.limit_price;
        } else {
            order.price = None;
        }
        order
    }
}

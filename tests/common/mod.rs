#![allow(dead_code)]

use simex_core::prelude::*;

pub fn new_engine() -> MatchingEngine {
    MatchingEngine::new(MatchingStrategy::Fifo, FeeSchedule::zero_fee())
}

pub fn new_engine_pro_rata() -> MatchingEngine {
    MatchingEngine::new(MatchingStrategy::ProRata, FeeSchedule::zero_fee())
}

pub fn fund(engine: &mut MatchingEngine, trader_id: &str, balance: Cash) {
    engine.register_trader(Trader::new(trader_id, balance, RiskConfig::default()));
}

pub fn limit(symbol: &str, trader: &str, side: Side, price: Price, qty: Qty, ts: i64) -> Order {
    Order::new_limit(OrderId::new_v4(), symbol, trader, side, price, qty, TimeInForce::Gtc, ts).unwrap()
}

pub fn limit_ioc(symbol: &str, trader: &str, side: Side, price: Price, qty: Qty, ts: i64) -> Order {
    Order::new_limit(OrderId::new_v4(), symbol, trader, side, price, qty, TimeInForce::Ioc, ts).unwrap()
}

pub fn market(symbol: &str, trader: &str, side: Side, qty: Qty, ts: i64) -> Order {
    Order::new_market(OrderId::new_v4(), symbol, trader, side, qty, ts).unwrap()
}

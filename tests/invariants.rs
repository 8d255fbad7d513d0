//! Property-based checks that hold across arbitrary sequences of submissions:
//! cash conservation, zero-sum position, and a never-crossed book.

mod common;

use common::*;
use proptest::prelude::*;
use simex_core::prelude::*;

const TRADERS: [&str; 3] = ["alice", "bob", "carol"];
const STARTING_BALANCE: Cash = 10_000_000;

#[derive(Debug, Clone)]
struct OrderSpec {
    trader_idx: usize,
    is_buy: bool,
    price: Price,
    qty: Qty,
}

fn order_spec_strategy() -> impl Strategy<Value = OrderSpec> {
    (0usize..TRADERS.len(), any::<bool>(), 95u128..106, 1u64..21).prop_map(
        |(trader_idx, is_buy, price, qty)| OrderSpec {
            trader_idx,
            is_buy,
            price,
            qty,
        },
    )
}

fn run_sequence(specs: &[OrderSpec]) -> MatchingEngine {
    let mut engine = new_engine();
    engine.add_order_book("AAPL");
    for trader_id in TRADERS {
        fund(&mut engine, trader_id, STARTING_BALANCE);
    }

    for (i, spec) in specs.iter().enumerate() {
        let side = if spec.is_buy { Side::Buy } else { Side::Sell };
        let order = limit("AAPL", TRADERS[spec.trader_idx], side, spec.price, spec.qty, i as i64);
        // Risk is out of scope for this property: traders are unconstrained,
        // so every submission is well-formed and admissible.
        let _ = engine.submit_order(order);
    }
    engine
}

proptest! {
    #[test]
    fn book_is_never_crossed(specs in prop::collection::vec(order_spec_strategy(), 0..40)) {
        let mut engine = run_sequence(&specs);
        let depth = engine.depth("AAPL", 1).unwrap();
        if let (Some(bid), Some(ask)) = (depth.bids.first(), depth.asks.first()) {
            prop_assert!(bid.price < ask.price);
        }
        let _ = &mut engine;
    }

    #[test]
    fn cash_is_conserved_across_all_fills(specs in prop::collection::vec(order_spec_strategy(), 0..40)) {
        let engine = run_sequence(&specs);
        let total: Cash = TRADERS.iter().map(|t| engine.trader(t).unwrap().balance).sum();
        prop_assert_eq!(total, STARTING_BALANCE * TRADERS.len() as Cash);
    }

    #[test]
    fn aggregate_position_is_zero_sum(specs in prop::collection::vec(order_spec_strategy(), 0..40)) {
        let engine = run_sequence(&specs);
        let total: i64 = TRADERS.iter().map(|t| engine.trader(t).unwrap().position("AAPL")).sum();
        prop_assert_eq!(total, 0);
    }

    #[test]
    fn every_trade_price_is_within_the_submitted_range(specs in prop::collection::vec(order_spec_strategy(), 0..40)) {
        let engine = run_sequence(&specs);
        for trade in engine.trades() {
            prop_assert!(trade.price >= 95 && trade.price <= 105);
        }
    }

    #[test]
    fn resting_depth_never_exceeds_total_submitted_quantity(specs in prop::collection::vec(order_spec_strategy(), 0..40)) {
        let submitted: u64 = specs.iter().map(|s| s.qty).sum();
        let engine = run_sequence(&specs);
        let depth = engine.depth("AAPL", usize::MAX).unwrap();
        let resting: u64 = depth.bids.iter().chain(depth.asks.iter()).map(|l| l.quantity).sum();
        prop_assert!(resting <= submitted);
    }
}

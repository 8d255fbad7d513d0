use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use simex_core::prelude::*;

fn build_engine(depth_per_side: u64) -> MatchingEngine {
    let mut engine = MatchingEngine::new(MatchingStrategy::Fifo, FeeSchedule::zero_fee());
    engine.add_order_book("AAPL");
    engine.register_trader(Trader::new("maker", 1_000_000_000, RiskConfig::default()));
    engine.register_trader(Trader::new("taker", 1_000_000_000, RiskConfig::default()));

    for i in 0..depth_per_side {
        let sell = Order::new_limit(
            OrderId::new_v4(),
            "AAPL",
            "maker",
            Side::Sell,
            100 + i as u128,
            10,
            TimeInForce::Gtc,
            i as i64,
        )
        .unwrap();
        engine.submit_order(sell).unwrap();
    }
    engine
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("resting_insert");
    for depth in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || {
                    let mut engine = MatchingEngine::new(MatchingStrategy::Fifo, FeeSchedule::zero_fee());
                    engine.add_order_book("AAPL");
                    engine.register_trader(Trader::new("maker", 1_000_000_000, RiskConfig::default()));
                    engine
                },
                |mut engine| {
                    for i in 0..depth {
                        let order = Order::new_limit(
                            OrderId::new_v4(),
                            "AAPL",
                            "maker",
                            Side::Sell,
                            100 + (i as u128 % 50),
                            10,
                            TimeInForce::Gtc,
                            i as i64,
                        )
                        .unwrap();
                        black_box(engine.submit_order(order).unwrap());
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_sweep");
    for depth in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || build_engine(depth),
                |mut engine| {
                    let order = Order::new_market(OrderId::new_v4(), "AAPL", "taker", Side::Buy, depth * 10, 999).unwrap();
                    black_box(engine.submit_order(order).unwrap());
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    c.bench_function("cancel_top_of_book", |b| {
        b.iter_batched(
            || build_engine(1_000),
            |mut engine| {
                // Exercises the lazy-deletion path on the ask heap.
                let _ = engine.cancel_all_for_trader("maker");
                black_box(engine.depth("AAPL", 1).unwrap());
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_insert, bench_sweep, bench_cancel);
criterion_main!(benches);

//! Event-bus payload correctness: subscribers must observe the order as it
//! actually lives in the book, not the pre-insertion value.

mod common;

use std::sync::{Arc, Mutex};

use common::*;
use simex_core::prelude::*;

#[test]
fn order_added_event_carries_the_assigned_sequence_number() {
    let mut engine = new_engine();
    engine.add_order_book("AAPL");
    fund(&mut engine, "A", 1_000_000);
    fund(&mut engine, "B", 1_000_000);

    let seen: Arc<Mutex<Vec<Option<u64>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    engine.subscribe(
        "order_added",
        Arc::new(move |event: &Event| {
            if let Event::OrderAdded(order) = event {
                seen_clone.lock().unwrap().push(order.sequence_number);
            }
        }),
    );

    engine.submit_order(limit("AAPL", "A", Side::Buy, 100, 1, 0)).unwrap();
    engine.submit_order(limit("AAPL", "B", Side::Buy, 99, 1, 1)).unwrap();

    let recorded = seen.lock().unwrap();
    assert_eq!(*recorded, vec![Some(0), Some(1)]);
}

#[test]
fn iceberg_replenishment_event_carries_the_assigned_sequence_number() {
    let mut engine = new_engine();
    engine.add_order_book("AAPL");
    fund(&mut engine, "S", 1_000_000);
    fund(&mut engine, "B", 1_000_000);

    let seen: Arc<Mutex<Vec<Option<u64>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    engine.subscribe(
        "order_added",
        Arc::new(move |event: &Event| {
            if let Event::OrderAdded(order) = event {
                seen_clone.lock().unwrap().push(order.sequence_number);
            }
        }),
    );

    let iceberg = Order::new_iceberg(
        OrderId::new_v4(),
        "AAPL",
        "S",
        Side::Sell,
        100,
        10,
        20,
        TimeInForce::Gtc,
        0,
    )
    .unwrap();
    engine.submit_order(iceberg).unwrap();
    // Fully fills the first child and triggers one replenishment.
    engine.submit_order(limit("AAPL", "B", Side::Buy, 100, 10, 1)).unwrap();

    let recorded = seen.lock().unwrap();
    assert_eq!(recorded.len(), 2);
    assert!(recorded.iter().all(|s| s.is_some()), "every order_added event must carry a real sequence_number, not None");
}

//! A minimal in-process publish/subscribe bus for engine events.
//!
//! Grounded on the reference crate's `BookManager` trade-listener pattern
//! (a boxed callback invoked synchronously on the book's own thread of
//! control) but collapsed to a single-threaded registry, since the engine
//! itself is single-threaded cooperative (see the crate's concurrency notes).

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use super::order::{Order, OrderId};
use super::trade::Trade;

/// Everything a subscriber can observe.
#[derive(Debug, Clone)]
pub enum Event {
    OrderAdded(Order),
    OrderRemoved(OrderId),
    TradeExecuted(Trade),
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::OrderAdded(_) => "order_added",
            Event::OrderRemoved(_) => "order_removed",
            Event::TradeExecuted(_) => "trade_executed",
        }
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Registry of event-name to handler lists.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(String, Handler)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` to be invoked for every event named `event`.
    /// Recognized names: `order_added`, `order_removed`, `trade_executed`.
    pub fn subscribe(&mut self, event: impl Into<String>, handler: Handler) {
        self.handlers.push((event.into(), handler));
    }

    /// Invokes every subscriber registered for `event.name()`. A subscriber
    /// that panics is isolated so it cannot unwind through the matching loop
    /// and drop a trade that already executed.
    pub fn publish(&self, event: &Event) {
        let name = event.name();
        for (registered, handler) in &self.handlers {
            if registered != name {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            if outcome.is_err() {
                error!(event = name, "event handler panicked; isolated");
            }
        }
    }
}

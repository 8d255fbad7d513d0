//! Small shared helpers used across the engine.

use std::sync::atomic::{AtomicI64, Ordering};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
///
/// Order timestamps are taken from this clock. Tests that need deterministic
/// timestamps construct `Order`s with an explicit timestamp instead of calling
/// this function.
#[must_use]
pub fn current_time_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A monotonically increasing counter, used where a strictly ordered id is
/// needed but cryptographic uniqueness (like `Uuid`) is not, e.g. trade ids.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    next: AtomicI64,
}

impl SequenceGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    #[must_use]
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) as u64
    }
}

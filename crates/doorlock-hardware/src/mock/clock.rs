//! Mock time source.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::Clock;

/// Deterministic clock for bounded-wait tests.
///
/// Time moves only when a delay is requested, when [`advance`] is called, or
/// by `auto_step` milliseconds on every `now_ms` read. A non-zero step lets a
/// polling loop reach its timeout without real sleeping.
///
/// [`advance`]: MockClock::advance
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<AtomicU64>,
    auto_step: u64,
}

impl MockClock {
    /// Clock that only moves on delays and explicit advances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that also moves `step_ms` on every read.
    pub fn with_auto_step(step_ms: u64) -> Self {
        Self {
            now: Arc::default(),
            auto_step: step_ms,
        }
    }

    /// Move time forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Current time without auto-stepping.
    pub fn elapsed_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.fetch_add(self.auto_step, Ordering::SeqCst)
    }

    fn delay_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_delay_advances() {
        let clock = MockClock::new();
        clock.delay_ms(50);
        assert_eq!(clock.now_ms(), 50);
        assert_eq!(clock.now_ms(), 50);
    }

    #[test]
    fn test_mock_clock_auto_step() {
        let clock = MockClock::with_auto_step(10);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_ms(), 10);
        assert_eq!(clock.elapsed_ms(), 20);
    }
}

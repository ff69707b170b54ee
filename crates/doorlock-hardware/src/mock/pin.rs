//! Mock digital output line.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::Result;
use crate::traits::OutputPin;

/// Output pin that records its level and how often it was driven.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockPin;
/// use doorlock_hardware::OutputPin;
///
/// let shared = MockPin::with_level(true);
/// let mut pin = shared.clone();
///
/// pin.set_low().unwrap();
/// assert!(!shared.is_high());
/// assert_eq!(shared.low_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPin {
    level: Arc<AtomicBool>,
    low_count: Arc<AtomicUsize>,
    high_count: Arc<AtomicUsize>,
}

impl MockPin {
    /// Create a pin that starts low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pin that starts at `high`.
    pub fn with_level(high: bool) -> Self {
        let pin = Self::default();
        pin.level.store(high, Ordering::SeqCst);
        pin
    }

    /// Current level.
    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Number of times the pin was driven low.
    pub fn low_count(&self) -> usize {
        self.low_count.load(Ordering::SeqCst)
    }

    /// Number of times the pin was driven high.
    pub fn high_count(&self) -> usize {
        self.high_count.load(Ordering::SeqCst)
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) -> Result<()> {
        self.level.store(true, Ordering::SeqCst);
        self.high_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_low(&mut self) -> Result<()> {
        self.level.store(false, Ordering::SeqCst);
        self.low_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//! Mock supply-sense line.

use crate::error::Result;
use crate::traits::{EdgeCallback, EdgeSource};

/// Edge source whose falling edge is fired by hand.
#[derive(Default)]
pub struct MockPowerSense {
    callback: Option<EdgeCallback>,
}

impl MockPowerSense {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the supply-sense line dropping.
    ///
    /// Does nothing if no callback is attached.
    pub fn fall(&mut self) {
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }

    /// Whether a callback has been attached.
    pub fn is_attached(&self) -> bool {
        self.callback.is_some()
    }
}

impl std::fmt::Debug for MockPowerSense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPowerSense")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl EdgeSource for MockPowerSense {
    fn attach_falling_edge(&mut self, callback: EdgeCallback) -> Result<()> {
        self.callback = Some(callback);
        Ok(())
    }
}

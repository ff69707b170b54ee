//! Power-fail event latch.
//!
//! A falling edge on the supply-sense line means the supply is collapsing and
//! the control loop has a few milliseconds to persist its state. The edge
//! arrives asynchronously (interrupt or signal context); the control loop
//! consumes it at normal priority.
//!
//! # State Machine
//!
//! ```text
//!            falling edge               take()
//! ┌──────┐ ───────────────> ┌─────┐ ────────────> ┌──────┐
//! │ Idle │                  │ Set │               │ Idle │ (returns true)
//! └──────┘ <─────────────── └─────┘               └──────┘
//!            take() = false
//! ```
//!
//! `take` reads and clears the flag in one indivisible `swap`, so an edge
//! that lands between "read" and "clear" cannot be lost: it is either
//! returned by this `take` or left set for the next one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::error::Result;
use crate::traits::EdgeSource;

/// Single-bit latch for the power-fail edge.
///
/// The latch is owned by the control loop; setters receive a
/// [`PowerFailTrigger`] that shares the same flag.
#[derive(Debug, Default)]
pub struct PowerFailLatch {
    flag: Arc<AtomicBool>,
}

impl PowerFailLatch {
    /// Create a latch in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for setting the latch from asynchronous context.
    pub fn trigger_handle(&self) -> PowerFailTrigger {
        PowerFailTrigger {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Register this latch on the falling edge of `source`.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the edge callback cannot be installed.
    pub fn attach<E: EdgeSource>(&self, source: &mut E) -> Result<()> {
        let trigger = self.trigger_handle();
        source.attach_falling_edge(Box::new(move || trigger.trigger()))
    }

    /// Return whether an edge was latched since the last call, clearing it.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Peek at the latch without clearing it.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Setter side of a [`PowerFailLatch`].
///
/// Cheap to clone and safe to call from interrupt or signal handlers: it
/// performs one atomic store and nothing else.
#[derive(Debug, Clone)]
pub struct PowerFailTrigger {
    flag: Arc<AtomicBool>,
}

impl PowerFailTrigger {
    /// Latch a power-fail event.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
        trace!("power-fail edge latched");
    }
}

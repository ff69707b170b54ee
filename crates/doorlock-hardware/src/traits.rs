//! Hardware collaborator trait definitions.
//!
//! These traits are the whole contract between the lock core and the board
//! it runs on. Each one is deliberately small so a test double can stand in
//! for the real peripheral.

use crate::error::Result;
use doorlock_core::LockCommand;

/// Full-duplex transfer on a serial peripheral bus.
///
/// Chip select is not part of this trait; callers drive it explicitly
/// through an [`OutputPin`] so every transaction has a visible
/// select/deselect pair.
pub trait SpiTransfer {
    /// Clock out `buf` and overwrite it with the bytes received.
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// A digital output line.
pub trait OutputPin {
    /// Drive the line high.
    fn set_high(&mut self) -> Result<()>;

    /// Drive the line low.
    fn set_low(&mut self) -> Result<()>;

    /// Drive the line to `high`.
    fn set_level(&mut self, high: bool) -> Result<()> {
        if high { self.set_high() } else { self.set_low() }
    }
}

/// Millisecond time source used by bounded polling loops.
///
/// Methods take `&self` so a shared clock can be handed to several
/// components.
pub trait Clock {
    /// Monotonic milliseconds since an arbitrary origin.
    fn now_ms(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn delay_ms(&self, ms: u64);
}

/// The door lock actuator.
///
/// A pure two-state sink: it receives [`LockCommand`]s and offers no
/// feedback about the physical bolt position.
///
/// # Examples
///
/// ```
/// use doorlock_core::LockCommand;
/// use doorlock_hardware::{LockActuator, LogActuator};
///
/// let mut actuator = LogActuator::new();
/// actuator.apply(LockCommand::Unlock).unwrap();
/// assert!(!actuator.state().is_locked());
/// ```
pub trait LockActuator {
    /// Drive the lock to the state described by `command`.
    fn apply(&mut self, command: LockCommand) -> Result<()>;
}

/// Callback invoked from edge-event context.
///
/// It may run on an interrupt thread, so it must be `Send` and must not
/// block.
pub type EdgeCallback = Box<dyn FnMut() + Send + 'static>;

/// A sense line that reports falling edges.
pub trait EdgeSource {
    /// Register `callback` to run on every falling edge.
    ///
    /// Registering again replaces the previous callback.
    fn attach_falling_edge(&mut self, callback: EdgeCallback) -> Result<()>;
}

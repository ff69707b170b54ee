//! Enum wrappers for actuator dispatch.
//!
//! The lock controller is generic over its actuator. When the concrete type
//! is chosen at runtime from configuration, [`AnyActuator`] provides concrete
//! type dispatch through a `match` instead of a trait object. Variants that
//! need board support only exist when the matching cargo feature is enabled.
//!
//! # Examples
//!
//! ```
//! use doorlock_core::LockCommand;
//! use doorlock_hardware::{AnyActuator, LockActuator, LogActuator};
//!
//! let mut actuator = AnyActuator::Log(LogActuator::new());
//! actuator.apply(LockCommand::Lock).unwrap();
//! ```

use doorlock_core::LockCommand;

use crate::Result;
use crate::actuator::LogActuator;
use crate::mock::MockActuator;
use crate::traits::LockActuator;

#[cfg(feature = "hardware-spi")]
use crate::{actuator::PinActuator, rpi::RpiOutputPin};

/// Enum wrapper for lock actuator dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyActuator {
    /// Logs commands only (simulated builds).
    Log(LogActuator),

    /// Records commands for tests.
    Mock(MockActuator),

    /// Raspberry Pi GPIO lock output and status LED.
    #[cfg(feature = "hardware-spi")]
    Gpio(PinActuator<RpiOutputPin>),
}

impl LockActuator for AnyActuator {
    fn apply(&mut self, command: LockCommand) -> Result<()> {
        match self {
            Self::Log(device) => device.apply(command),
            Self::Mock(device) => device.apply(command),
            #[cfg(feature = "hardware-spi")]
            Self::Gpio(device) => device.apply(command),
        }
    }
}

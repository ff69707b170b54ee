//! Hardware collaborator layer for the door lock core.
//!
//! This crate defines the narrow interfaces the lock core uses to reach the
//! outside world, plus implementations of them for development, testing, and
//! (behind the `hardware-spi` feature) a Raspberry Pi.
//!
//! # Collaborator Traits
//!
//! - [`SpiTransfer`]: full-duplex byte transfer on a serial peripheral bus
//! - [`OutputPin`]: a digital output line (chip select, reset, lock, LED)
//! - [`Clock`]: millisecond time source and blocking delay for bounded waits
//! - [`LockActuator`]: the two-state lock sink consuming [`LockCommand`]s
//! - [`EdgeSource`]: a sense line that can report falling edges
//!
//! All traits are synchronous. The core runs a single cooperative control
//! loop and every wait it performs has a hard upper bound.
//!
//! # Power-Fail Latch
//!
//! [`PowerFailLatch`] captures a falling edge on the supply-sense line and
//! hands it to the control loop exactly once:
//!
//! ```
//! use doorlock_hardware::PowerFailLatch;
//! use doorlock_hardware::mock::MockPowerSense;
//!
//! let latch = PowerFailLatch::new();
//! let mut sense = MockPowerSense::new();
//! latch.attach(&mut sense).unwrap();
//!
//! sense.fall();
//! assert!(latch.take());
//! assert!(!latch.take());
//! ```
//!
//! # Actuator Dispatch
//!
//! Concrete actuators are selected through the [`AnyActuator`] enum rather
//! than trait objects; see [`devices`].
//!
//! [`LockCommand`]: doorlock_core::LockCommand

pub mod actuator;
pub mod clock;
pub mod devices;
pub mod error;
pub mod mock;
pub mod power;
#[cfg(feature = "hardware-spi")]
pub mod rpi;
pub mod traits;

// Re-export commonly used types for convenience
pub use actuator::{LogActuator, PinActuator};
pub use clock::SystemClock;
pub use devices::AnyActuator;
pub use error::{HardwareError, Result};
pub use power::{PowerFailLatch, PowerFailTrigger};
pub use traits::{Clock, EdgeCallback, EdgeSource, LockActuator, OutputPin, SpiTransfer};

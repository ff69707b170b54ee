//! Mock collaborator implementations for testing and development.
//!
//! These stand-ins can be driven and inspected programmatically without any
//! board attached. Clones of a mock share state, so a test can keep one copy
//! for inspection while the code under test owns another.

pub mod actuator;
pub mod clock;
pub mod pin;
pub mod power;

// Re-export commonly used types
pub use actuator::{MockActuator, MockActuatorHandle};
pub use clock::MockClock;
pub use pin::MockPin;
pub use power::MockPowerSense;

//! Door access-control core.
//!
//! [`DoorController`] runs one door: it evaluates presented tags against an
//! [`AccessList`], enforces the wrong-attempt [`LockoutPolicy`], drives the
//! lock actuator and keeps the persisted security record current, including
//! an immediate save when the power-fail latch fires.

pub mod access;
pub mod controller;
pub mod events;
pub mod policy;

pub use access::{AccessList, AuthorizedTags};
pub use controller::{ControllerConfig, DoorController};
pub use events::{AccessEvent, AccessLog, DEFAULT_EVENT_LOG_CAPACITY};
pub use policy::{
    Evaluation, LockoutPolicy, PolicyConfig, PolicyState, PolicyTransition, Tick,
};

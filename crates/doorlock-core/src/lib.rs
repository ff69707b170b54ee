//! Shared vocabulary of the door lock core: tag identifiers, lock states and
//! commands, protocol and policy constants.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{LockCommand, LockState, TagIdentifier, xor_fold};

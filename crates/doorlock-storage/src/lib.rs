//! Persistence for the door lock security state.
//!
//! The only durable entity is a five-byte record holding the lock state, the
//! wrong-attempt counter and the remaining lockout seconds, guarded by a
//! magic byte and an XOR checksum. [`SecurityStateStore`] reads it back
//! after every power cycle and repairs it to safe defaults if it was never
//! written or was torn by a power loss mid-write.
//!
//! # Components
//!
//! - [`PersistedSecurityState`]: the record and its codec
//! - [`SecurityStateStore`]: load/save over any [`ByteStorage`]
//! - [`MemoryStorage`], [`FileStorage`]: byte storage backends
//!
//! # Example
//!
//! ```no_run
//! use doorlock_storage::{FileStorage, SecurityStateStore};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileStorage::open("doorlock.eeprom", 1024)?;
//! let mut store = SecurityStateStore::new(storage);
//! let state = store.load()?;
//! println!("lockout remaining: {}s", state.lockout_seconds_remaining);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod error;
pub mod record;
pub mod store;

pub use backends::{ByteStorage, FileStorage, MemoryStorage};
pub use error::{RecordFault, StorageError, StorageResult};
pub use record::{PersistedSecurityState, RecordLimits};
pub use store::SecurityStateStore;

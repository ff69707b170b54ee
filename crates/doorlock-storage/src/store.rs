//! Load/save of the security record with self-healing on corruption.

use doorlock_core::constants::{RECORD_OFFSET, RECORD_SIZE};
use tracing::{debug, warn};

use crate::backends::ByteStorage;
use crate::error::StorageResult;
use crate::record::{PersistedSecurityState, RecordLimits};

/// Owner of the persisted security record.
///
/// # Examples
///
/// ```
/// use doorlock_core::LockState;
/// use doorlock_storage::{MemoryStorage, SecurityStateStore};
///
/// let mut store = SecurityStateStore::new(MemoryStorage::new());
///
/// // Erased storage loads as the defaults, which are written back.
/// let mut state = store.load().unwrap();
/// assert_eq!(state.lock_state, LockState::Locked);
///
/// state.wrong_attempts = 2;
/// store.save(&state).unwrap();
/// assert_eq!(store.load().unwrap().wrong_attempts, 2);
/// ```
#[derive(Debug)]
pub struct SecurityStateStore<B> {
    storage: B,
    limits: RecordLimits,
}

impl<B: ByteStorage> SecurityStateStore<B> {
    /// Store with the default attempt and lockout limits.
    pub fn new(storage: B) -> Self {
        Self::with_limits(storage, RecordLimits::default())
    }

    pub fn with_limits(storage: B, limits: RecordLimits) -> Self {
        Self { storage, limits }
    }

    pub fn limits(&self) -> RecordLimits {
        self.limits
    }

    /// Read the record, repairing it if it is uninitialized or corrupt.
    ///
    /// A record with a wrong magic byte, a wrong checksum, or an unknown lock
    /// state is replaced by the defaults (Locked, 0 attempts, no lockout).
    /// Counts above the configured limits are clamped to them instead. Either
    /// repair is written back before returning, so loading again yields the
    /// same state.
    ///
    /// # Errors
    ///
    /// Only if the storage read or the repair write fails.
    pub fn load(&mut self) -> StorageResult<PersistedSecurityState> {
        let mut bytes = [0u8; RECORD_SIZE];
        self.storage.get(RECORD_OFFSET, &mut bytes)?;

        match PersistedSecurityState::decode(&bytes, self.limits) {
            Ok(state) if state.encode() != bytes => {
                warn!(
                    ?state,
                    stored_attempts = bytes[2],
                    stored_lockout = bytes[3],
                    "security record exceeds configured limits, clamping"
                );
                self.save(&state)?;
                Ok(state)
            }
            Ok(state) => {
                debug!(?state, "security record loaded");
                Ok(state)
            }
            Err(fault) => {
                warn!(%fault, "security record invalid, resetting to defaults");
                let state = PersistedSecurityState::default();
                self.save(&state)?;
                Ok(state)
            }
        }
    }

    /// Write `state` with a fresh magic byte and checksum.
    ///
    /// # Errors
    ///
    /// Only if the storage write fails.
    pub fn save(&mut self, state: &PersistedSecurityState) -> StorageResult<()> {
        self.storage.put(RECORD_OFFSET, &state.encode())?;
        debug!(?state, "security record saved");
        Ok(())
    }

    pub fn storage(&self) -> &B {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut B {
        &mut self.storage
    }

    pub fn into_inner(self) -> B {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryStorage;
    use doorlock_core::LockState;
    use doorlock_core::constants::ERASED_BYTE;

    fn store() -> (SecurityStateStore<MemoryStorage>, MemoryStorage) {
        let backing = MemoryStorage::new();
        (SecurityStateStore::new(backing.clone()), backing)
    }

    #[test]
    fn test_fresh_storage_initialized() {
        let (mut store, backing) = store();

        let state = store.load().unwrap();

        assert_eq!(state, PersistedSecurityState::default());
        assert_eq!(&backing.snapshot()[..5], &[0xA5, 0, 0, 0, 0xA5]);
        assert_eq!(backing.snapshot()[5], ERASED_BYTE);
    }

    #[test]
    fn test_tampered_checksum_reset() {
        let (mut store, backing) = store();
        store
            .save(&PersistedSecurityState {
                lock_state: LockState::Locked,
                wrong_attempts: 2,
                lockout_seconds_remaining: 0,
            })
            .unwrap();
        backing.poke(4, 0x00);

        assert_eq!(store.load().unwrap(), PersistedSecurityState::default());
        assert_eq!(store.load().unwrap(), PersistedSecurityState::default());
    }

    #[test]
    fn test_over_limit_record_clamped_and_persisted() {
        let (mut store, backing) = store();
        backing.poke(2, 7);
        backing.poke(3, 90);
        backing.poke(0, 0xA5);
        backing.poke(1, 0);
        backing.poke(4, 0xA5 ^ 7 ^ 90);

        let state = store.load().unwrap();

        assert_eq!(state.lock_state, LockState::Locked);
        assert_eq!(state.wrong_attempts, 3);
        assert_eq!(state.lockout_seconds_remaining, 30);
        assert_eq!(&backing.snapshot()[..5], &[0xA5, 0, 3, 30, 0xA5 ^ 3 ^ 30]);

        backing.reject_writes(true);
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_valid_record_not_rewritten() {
        let (mut store, backing) = store();
        store.load().unwrap();
        backing.reject_writes(true);

        assert!(store.load().is_ok());
    }

    #[test]
    fn test_repair_write_failure_surfaces() {
        let (mut store, backing) = store();
        backing.reject_writes(true);

        assert!(store.load().is_err());
    }

    #[test]
    fn test_save_failure_surfaces() {
        let (mut store, backing) = store();
        backing.reject_writes(true);

        assert!(store.save(&PersistedSecurityState::default()).is_err());
    }
}

//! The persisted security record.
//!
//! Five bytes at a fixed offset:
//!
//! ```text
//! offset  0      1          2              3                   4
//!         magic  lockState  wrongAttempts  lockoutRemaining    checksum
//!         0xA5   0 | 1      0..=max        0..=lockout secs    xor(0..4)
//! ```
//!
//! Counts above the configured maximums are clamped on decode; only the
//! magic, the checksum and the lock state make a record corrupt.

use doorlock_core::constants::{LOCKOUT_SECONDS, MAX_WRONG_ATTEMPTS, RECORD_MAGIC, RECORD_SIZE};
use doorlock_core::{LockState, xor_fold};
use serde::{Deserialize, Serialize};

use crate::error::RecordFault;

/// Upper bounds a loaded record is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLimits {
    pub max_wrong_attempts: u8,
    pub lockout_seconds: u8,
}

impl Default for RecordLimits {
    fn default() -> Self {
        Self {
            max_wrong_attempts: MAX_WRONG_ATTEMPTS,
            lockout_seconds: LOCKOUT_SECONDS,
        }
    }
}

/// Security state that survives power loss.
///
/// The magic byte and checksum exist only in the encoded form; they are
/// recomputed on every [`encode`](Self::encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedSecurityState {
    pub lock_state: LockState,
    pub wrong_attempts: u8,
    pub lockout_seconds_remaining: u8,
}

impl PersistedSecurityState {
    /// Encode with magic and checksum.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_storage::PersistedSecurityState;
    ///
    /// let bytes = PersistedSecurityState::default().encode();
    /// assert_eq!(bytes, [0xA5, 0x00, 0x00, 0x00, 0xA5]);
    /// ```
    #[must_use]
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [
            RECORD_MAGIC,
            self.lock_state.to_u8(),
            self.wrong_attempts,
            self.lockout_seconds_remaining,
            0,
        ];
        bytes[RECORD_SIZE - 1] = xor_fold(&bytes[..RECORD_SIZE - 1]);
        bytes
    }

    /// Decode and validate a stored record.
    ///
    /// Attempt and lockout counts above `limits` are clamped down to them
    /// rather than rejected, so a running lockout never shortens past the
    /// configured duration and never disappears.
    ///
    /// # Errors
    ///
    /// The first check that fails, in order: magic, checksum, lock state.
    pub fn decode(bytes: &[u8; RECORD_SIZE], limits: RecordLimits) -> Result<Self, RecordFault> {
        let [magic, lock, attempts, lockout, checksum] = *bytes;

        if magic != RECORD_MAGIC {
            return Err(RecordFault::BadMagic { found: magic });
        }
        let expected = xor_fold(&bytes[..RECORD_SIZE - 1]);
        if checksum != expected {
            return Err(RecordFault::BadChecksum {
                expected,
                found: checksum,
            });
        }

        let lock_state = LockState::from_u8(lock).map_err(|_| RecordFault::OutOfRange {
            field: "lockState",
            value: lock,
        })?;

        Ok(Self {
            lock_state,
            wrong_attempts: attempts.min(limits.max_wrong_attempts),
            lockout_seconds_remaining: lockout.min(limits.lockout_seconds),
        })
    }

    /// True while a lockout countdown is running.
    pub fn is_locked_out(&self) -> bool {
        self.lockout_seconds_remaining > 0
    }
}

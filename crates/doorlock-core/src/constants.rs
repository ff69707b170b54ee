//! Core constants for the door lock access-control core.
//!
//! This module gathers every fixed value the lock depends on: the security
//! policy limits, the layout of the persisted security record, and the
//! contactless-card command bytes used by the live reader backend.
//!
//! # Persisted Record Layout
//!
//! The security record occupies five bytes at a fixed offset of the
//! non-volatile store:
//!
//! ```text
//! offset 0      1          2              3                 4
//!        magic  lockState  wrongAttempts  lockoutRemaining  checksum
//! ```
//!
//! The checksum is the XOR of the four preceding bytes.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//!
//! assert_eq!(MAX_WRONG_ATTEMPTS, 3);
//! assert_eq!(LOCKOUT_SECONDS, 30);
//! assert_eq!(RECORD_SIZE, 5);
//! ```

// ============================================================================
// Security Policy
// ============================================================================

/// Number of consecutive non-matching tags that triggers a lockout.
///
/// # Value: 3
pub const MAX_WRONG_ATTEMPTS: u8 = 3;

/// Duration of a lockout episode in seconds.
///
/// Stored in a single byte of the persisted record, so configured values
/// must not exceed 255.
///
/// # Value: 30 seconds
pub const LOCKOUT_SECONDS: u8 = 30;

/// Seconds the door stays unlocked after a granted tag before relocking.
///
/// # Value: 5 seconds
pub const DEFAULT_UNLOCK_HOLD_SECONDS: u16 = 5;

// ============================================================================
// Persisted Record
// ============================================================================

/// Sentinel byte marking an initialized security record.
pub const RECORD_MAGIC: u8 = 0xA5;

/// Byte offset of the security record in durable storage.
pub const RECORD_OFFSET: usize = 0;

/// Size of the security record in bytes.
pub const RECORD_SIZE: usize = 5;

/// Value of an erased storage cell.
///
/// Fresh EEPROM and the file-backed image both read back as `0xFF`, which
/// never equals [`RECORD_MAGIC`].
pub const ERASED_BYTE: u8 = 0xFF;

/// Default capacity of a byte storage image (1 KiB, ATmega328P EEPROM size).
pub const DEFAULT_STORAGE_CAPACITY: usize = 1024;

// ============================================================================
// Tag Identifiers
// ============================================================================

/// Number of identifier bytes produced by Cascade Level 1 anticollision.
pub const UID_LENGTH: usize = 4;

/// Largest identifier any ISO 14443A card can report (triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Simulated Reader
// ============================================================================

/// Maximum characters buffered for one simulated input line.
///
/// Longer lines are discarded rather than grown without bound.
pub const MAX_SIM_LINE_LENGTH: usize = 64;

// ============================================================================
// Contactless Protocol (ISO 14443A)
// ============================================================================

/// REQA wake-up command, sent as a 7-bit short frame.
pub const PICC_CMD_REQA: u8 = 0x26;

/// Select / anticollision command for Cascade Level 1.
pub const PICC_CMD_SEL_CL1: u8 = 0x93;

/// NVB value announcing that no UID bits are known yet.
pub const NVB_NO_UID_BITS: u8 = 0x20;

/// Bound on waiting for a transceive to complete (milliseconds).
pub const TRANSCEIVE_TIMEOUT_MS: u64 = 50;

/// Bound on waiting for the CRC coprocessor (milliseconds).
pub const CRC_TIMEOUT_MS: u64 = 20;

/// Settle interval around reset pulses and soft reset (milliseconds).
pub const RESET_SETTLE_MS: u64 = 50;

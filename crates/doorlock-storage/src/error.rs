use std::path::PathBuf;

use thiserror::Error;

/// Failures of the durable byte store.
///
/// A corrupt security record is not an error; the store repairs it. These
/// variants only describe the storage primitive itself failing.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Access outside the device
    #[error("access of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Existing image file is larger than the configured device
    #[error("image {path} is {actual} bytes, expected at most {expected}")]
    ImageSize {
        path: PathBuf,
        expected: usize,
        actual: u64,
    },

    /// Write rejected by the device
    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Why a stored record was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordFault {
    /// First byte is not the record sentinel
    #[error("magic byte 0x{found:02X}")]
    BadMagic { found: u8 },

    /// Checksum does not match the other fields
    #[error("checksum 0x{found:02X}, expected 0x{expected:02X}")]
    BadChecksum { expected: u8, found: u8 },

    /// A field holds a value the policy can never produce
    #[error("{field} = {value} out of range")]
    OutOfRange { field: &'static str, value: u8 },
}

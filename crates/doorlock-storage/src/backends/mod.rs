//! Durable byte storage primitives.
//!
//! The security store only needs `get`/`put` over a small fixed-size address
//! space, the shape of an on-chip EEPROM. Two implementations are provided:
//!
//! - [`MemoryStorage`]: volatile, shareable between clones, with fault
//!   injection for tests
//! - [`FileStorage`]: a fixed-size image file, every write synced to disk

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::{StorageError, StorageResult};

/// Fixed-capacity byte-addressed storage.
pub trait ByteStorage {
    /// Size of the address space in bytes.
    fn capacity(&self) -> usize;

    /// Fill `buf` from `offset`.
    ///
    /// # Errors
    ///
    /// Fails as a whole; `buf` contents are unspecified on error.
    fn get(&mut self, offset: usize, buf: &mut [u8]) -> StorageResult<()>;

    /// Write `bytes` at `offset`.
    ///
    /// # Errors
    ///
    /// Fails as a whole.
    fn put(&mut self, offset: usize, bytes: &[u8]) -> StorageResult<()>;
}

/// Reject accesses that would run past `capacity`.
pub(crate) fn check_bounds(offset: usize, len: usize, capacity: usize) -> StorageResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StorageError::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}

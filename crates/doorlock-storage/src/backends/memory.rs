use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorlock_core::constants::{DEFAULT_STORAGE_CAPACITY, ERASED_BYTE};

use super::{ByteStorage, check_bounds};
use crate::error::{StorageError, StorageResult};

/// In-memory EEPROM image.
///
/// Clones share the same cells, so a test can keep one clone to inspect or
/// corrupt what the store wrote through another.
///
/// # Examples
///
/// ```
/// use doorlock_storage::{ByteStorage, MemoryStorage};
///
/// let backing = MemoryStorage::new();
/// let mut storage = backing.clone();
/// storage.put(0, &[1, 2, 3]).unwrap();
///
/// assert_eq!(&backing.snapshot()[..4], &[1, 2, 3, 0xFF]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    cells: Arc<Mutex<Vec<u8>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// 1 KiB, erased.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STORAGE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Arc::new(Mutex::new(vec![ERASED_BYTE; capacity])),
            reject_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Copy of every cell.
    pub fn snapshot(&self) -> Vec<u8> {
        self.cells().clone()
    }

    /// Overwrite one cell directly, bypassing fault injection. Offsets past
    /// the end are ignored.
    pub fn poke(&self, offset: usize, value: u8) {
        if let Some(cell) = self.cells().get_mut(offset) {
            *cell = value;
        }
    }

    /// Make every subsequent `put` fail until cleared.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn cells(&self) -> MutexGuard<'_, Vec<u8>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStorage for MemoryStorage {
    fn capacity(&self) -> usize {
        self.cells().len()
    }

    fn get(&mut self, offset: usize, buf: &mut [u8]) -> StorageResult<()> {
        let cells = self.cells();
        check_bounds(offset, buf.len(), cells.len())?;
        buf.copy_from_slice(&cells[offset..offset + buf.len()]);
        Ok(())
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) -> StorageResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected("memory storage is read-only".into()));
        }
        let mut cells = self.cells();
        check_bounds(offset, bytes.len(), cells.len())?;
        cells[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_storage_is_erased() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.capacity(), 1024);
        assert!(storage.snapshot().iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut storage = MemoryStorage::with_capacity(8);
        let mut buf = [0u8; 4];
        assert!(matches!(
            storage.get(6, &mut buf),
            Err(StorageError::OutOfBounds { .. })
        ));
        assert!(storage.put(8, &[1]).is_err());
    }

    #[test]
    fn test_rejected_write_leaves_cells() {
        let mut storage = MemoryStorage::with_capacity(4);
        storage.reject_writes(true);
        assert!(storage.put(0, &[1, 2]).is_err());
        assert_eq!(storage.snapshot(), vec![ERASED_BYTE; 4]);

        storage.reject_writes(false);
        storage.put(0, &[1, 2]).unwrap();
        assert_eq!(storage.snapshot(), vec![1, 2, ERASED_BYTE, ERASED_BYTE]);
    }
}

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use doorlock_core::constants::ERASED_BYTE;
use tracing::{debug, info};

use super::{ByteStorage, check_bounds};
use crate::error::{StorageError, StorageResult};

/// EEPROM image kept in a file.
///
/// The file is created erased on first use and padded with erased bytes if
/// it is shorter than `capacity`. Every `put` is followed by `sync_data`.
#[derive(Debug)]
pub struct FileStorage {
    file: File,
    path: PathBuf,
    capacity: usize,
}

impl FileStorage {
    /// Open or create the image at `path`.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be opened or extended, `ImageSize` if an
    /// existing image is larger than `capacity`.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let actual = file.metadata()?.len();
        if actual > capacity as u64 {
            return Err(StorageError::ImageSize {
                path,
                expected: capacity,
                actual,
            });
        }
        if actual < capacity as u64 {
            let missing = capacity - actual as usize;
            file.seek(SeekFrom::Start(actual))?;
            file.write_all(&vec![ERASED_BYTE; missing])?;
            file.sync_data()?;
            info!(path = %path.display(), capacity, "storage image initialized");
        }

        Ok(Self {
            file,
            path,
            capacity,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStorage for FileStorage {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn get(&mut self, offset: usize, buf: &mut [u8]) -> StorageResult<()> {
        check_bounds(offset, buf.len(), self.capacity)?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) -> StorageResult<()> {
        check_bounds(offset, bytes.len(), self.capacity)?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(bytes)?;
        self.file.sync_data()?;
        debug!(offset, len = bytes.len(), "storage image written");
        Ok(())
    }
}

//! Card presence detector contract.

use doorlock_core::TagIdentifier;
use doorlock_core::constants::MAX_UID_LENGTH;

/// Non-blocking source of tag identifiers.
///
/// Both backends share one contract: `tag_available` does at most one
/// incremental step of work and reports whether an identifier is buffered;
/// `read_tag` hands the buffered identifier out exactly once.
///
/// # Examples
///
/// ```
/// use doorlock_rfid::{ScriptedSource, SerialTagReader, TagReader};
///
/// let mut reader = SerialTagReader::new(ScriptedSource::from("04:AB:10:9F\n"));
/// assert!(reader.tag_available());
///
/// let mut buf = [0u8; 10];
/// assert_eq!(reader.read_tag(&mut buf), 4);
/// assert_eq!(&buf[..4], &[0x04, 0xAB, 0x10, 0x9F]);
/// assert_eq!(reader.read_tag(&mut buf), 0);
/// ```
pub trait TagReader {
    /// Advance acquisition by one step; true while an unread tag is buffered.
    fn tag_available(&mut self) -> bool;

    /// Copy the buffered identifier into `buffer` and mark it consumed.
    ///
    /// Returns the number of bytes written, `min(len, buffer.len())`. Returns
    /// 0 without consuming anything if no tag is buffered or `buffer` is
    /// empty.
    fn read_tag(&mut self, buffer: &mut [u8]) -> usize;

    /// Consume the buffered identifier, if any.
    fn take_tag(&mut self) -> Option<TagIdentifier> {
        let mut buf = [0u8; MAX_UID_LENGTH];
        match self.read_tag(&mut buf) {
            0 => None,
            n => TagIdentifier::new(&buf[..n]).ok(),
        }
    }
}

/// One-deep buffer holding an identifier until it is read.
#[derive(Debug, Default)]
pub(crate) struct TagSlot {
    pending: Option<TagIdentifier>,
}

impl TagSlot {
    pub(crate) fn store(&mut self, tag: TagIdentifier) {
        self.pending = Some(tag);
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn copy_out(&mut self, buffer: &mut [u8]) -> usize {
        if buffer.is_empty() {
            return 0;
        }
        let Some(tag) = self.pending.take() else {
            return 0;
        };
        let n = tag.len().min(buffer.len());
        buffer[..n].copy_from_slice(&tag.as_bytes()[..n]);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> TagSlot {
        let mut slot = TagSlot::default();
        slot.store(TagIdentifier::from_uid4([0x04, 0xAB, 0x10, 0x9F]));
        slot
    }

    #[test]
    fn test_copy_out_consumes_once() {
        let mut slot = loaded();
        let mut buf = [0u8; 8];

        assert_eq!(slot.copy_out(&mut buf), 4);
        assert_eq!(&buf[..4], &[0x04, 0xAB, 0x10, 0x9F]);
        assert!(!slot.is_ready());
        assert_eq!(slot.copy_out(&mut buf), 0);
    }

    #[test]
    fn test_copy_out_truncates_to_buffer() {
        let mut slot = loaded();
        let mut buf = [0u8; 2];

        assert_eq!(slot.copy_out(&mut buf), 2);
        assert_eq!(buf, [0x04, 0xAB]);
        assert!(!slot.is_ready());
    }

    #[test]
    fn test_empty_buffer_keeps_tag() {
        let mut slot = loaded();

        assert_eq!(slot.copy_out(&mut []), 0);
        assert!(slot.is_ready());
    }

    #[test]
    fn test_empty_slot_writes_nothing() {
        let mut slot = TagSlot::default();
        let mut buf = [0xEEu8; 4];

        assert_eq!(slot.copy_out(&mut buf), 0);
        assert_eq!(buf, [0xEE; 4]);
    }
}

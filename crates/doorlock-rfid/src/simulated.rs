//! Simulated reader: tag identifiers typed as hex lines.
//!
//! Stands in for the reader chip during bring-up. Lines look like
//! `04:AB:10:9F` but the parser is lenient: any non-hex character is skipped,
//! so `04 ab 10 9f`, `04-AB-10-9F` and `uid=04ab109f` all yield the same
//! identifier.
//!
//! # Line Rules
//!
//! - Lines end at `\r` or `\n`; surrounding whitespace is trimmed and empty
//!   lines are skipped.
//! - A line longer than 64 characters is discarded before it completes.
//! - Hex digits are paired in order. More than 10 pairs rejects the line;
//!   fewer than 4 rejects it. The first 4 bytes become the identifier.

use std::collections::VecDeque;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use doorlock_core::TagIdentifier;
use doorlock_core::constants::{MAX_SIM_LINE_LENGTH, UID_LENGTH};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, RfidError};
use crate::reader::{TagReader, TagSlot};

/// Non-blocking supply of input characters.
pub trait ByteSource {
    /// Next pending byte, or `None` if nothing is waiting right now.
    fn next_byte(&mut self) -> Option<u8>;
}

/// In-memory byte queue.
///
/// # Examples
///
/// ```
/// use doorlock_rfid::{ByteSource, ScriptedSource};
///
/// let mut source = ScriptedSource::from("ab");
/// source.push_line("cd");
///
/// assert_eq!(source.next_byte(), Some(b'a'));
/// assert_eq!(source.remaining(), 4);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    queue: VecDeque<u8>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes);
    }

    /// Queue `line` followed by `\n`.
    pub fn push_line(&mut self, line: &str) {
        self.push_bytes(line.as_bytes());
        self.queue.push_back(b'\n');
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl From<&str> for ScriptedSource {
    fn from(text: &str) -> Self {
        Self {
            queue: text.bytes().collect(),
        }
    }
}

impl ByteSource for ScriptedSource {
    fn next_byte(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }
}

/// Byte source fed through a tokio channel.
///
/// The sending half is handed to whatever task reads the terminal; the
/// reader drains it with `try_recv`, so polling never waits.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
    pending: Bytes,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                rx,
                pending: Bytes::new(),
            },
            tx,
        )
    }
}

impl ByteSource for ChannelSource {
    fn next_byte(&mut self) -> Option<u8> {
        while !self.pending.has_remaining() {
            self.pending = self.rx.try_recv().ok()?;
        }
        Some(self.pending.get_u8())
    }
}

/// Extract an identifier from one trimmed input line.
///
/// # Errors
///
/// `TooFewHexPairs` if the line holds fewer than 4 pairs. Pairs past the
/// fourth are counted but not kept.
///
/// # Examples
///
/// ```
/// use doorlock_rfid::simulated::parse_tag_line;
///
/// let tag = parse_tag_line(b"uid 04-ab-10-9f").unwrap();
/// assert_eq!(tag.to_string(), "04:AB:10:9F");
/// assert!(parse_tag_line(b"04:AB:10").is_err());
/// ```
pub fn parse_tag_line(line: &[u8]) -> Result<TagIdentifier> {
    let mut bytes = [0u8; UID_LENGTH];
    let mut count = 0;
    let mut high: Option<u8> = None;

    for &c in line {
        let Some(nibble) = char::from(c).to_digit(16) else {
            continue;
        };
        let nibble = nibble as u8;
        match high.take() {
            None => high = Some(nibble),
            Some(h) => {
                if let Some(slot) = bytes.get_mut(count) {
                    *slot = (h << 4) | nibble;
                }
                count += 1;
            }
        }
    }

    if count < UID_LENGTH {
        return Err(RfidError::TooFewHexPairs {
            found: count,
            required: UID_LENGTH,
        });
    }
    Ok(TagIdentifier::from_uid4(bytes))
}

/// [`TagReader`] over a line-oriented text source.
#[derive(Debug)]
pub struct SerialTagReader<S: ByteSource> {
    source: S,
    line: BytesMut,
    slot: TagSlot,
}

impl<S: ByteSource> SerialTagReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            line: BytesMut::with_capacity(MAX_SIM_LINE_LENGTH + 1),
            slot: TagSlot::default(),
        }
    }

    /// The underlying byte source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Characters of the current unterminated line.
    pub fn pending_len(&self) -> usize {
        self.line.len()
    }

    /// Consume input up to and including the next non-empty line.
    fn pump(&mut self) {
        while let Some(byte) = self.source.next_byte() {
            if byte == b'\r' || byte == b'\n' {
                let line = self.line.split().freeze();
                let trimmed = line.trim_ascii();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_tag_line(trimmed) {
                    Ok(tag) => {
                        debug!(%tag, "simulated tag accepted");
                        self.slot.store(tag);
                    }
                    Err(e) => debug!(error = %e, "simulated line rejected"),
                }
                return;
            }

            self.line.put_u8(byte);
            if self.line.len() > MAX_SIM_LINE_LENGTH {
                warn!(
                    limit = MAX_SIM_LINE_LENGTH,
                    "simulated input line too long, discarded"
                );
                self.line.clear();
            }
        }
    }
}

impl<S: ByteSource> TagReader for SerialTagReader<S> {
    fn tag_available(&mut self) -> bool {
        if !self.slot.is_ready() {
            self.pump();
        }
        self.slot.is_ready()
    }

    fn read_tag(&mut self, buffer: &mut [u8]) -> usize {
        self.slot.copy_out(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const UID: [u8; 4] = [0x04, 0xAB, 0x10, 0x9F];

    fn reader(text: &str) -> SerialTagReader<ScriptedSource> {
        SerialTagReader::new(ScriptedSource::from(text))
    }

    #[rstest]
    #[case("04:AB:10:9F")]
    #[case("04 ab 10 9f")]
    #[case("04-AB-10-9F")]
    #[case("04AB109F")]
    #[case("uid=04ab109f")]
    #[case("04:AB:10:9F:11:22:33")]
    #[case("  04:AB:10:9F  ")]
    fn test_parse_accepts(#[case] line: &str) {
        let tag = parse_tag_line(line.trim().as_bytes()).unwrap();
        assert_eq!(tag.as_bytes(), &UID);
    }

    #[rstest]
    #[case("04:AB:10")]
    #[case("hello")]
    #[case("0:4:A:B:1:0")]
    fn test_parse_too_few(#[case] line: &str) {
        assert!(matches!(
            parse_tag_line(line.as_bytes()),
            Err(RfidError::TooFewHexPairs { .. })
        ));
    }

    #[test]
    fn test_parse_long_line_keeps_first_four() {
        let line = "04:AB:10:9F:00:11:22:33:44:55:66";
        let tag = parse_tag_line(line.as_bytes()).unwrap();
        assert_eq!(tag.as_bytes(), &UID);

        let mut reader = reader("04:AB:10:9F:00:11:22:33:44:55:66\n");
        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);
    }

    #[test]
    fn test_parse_ten_pairs_accepted() {
        let line = "00:11:22:33:44:55:66:77:88:99";
        let tag = parse_tag_line(line.as_bytes()).unwrap();
        assert_eq!(tag.as_bytes(), &[0x00, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn test_parse_trailing_nibble_ignored() {
        let tag = parse_tag_line(b"04AB109FE").unwrap();
        assert_eq!(tag.as_bytes(), &UID);
    }

    #[test]
    fn test_read_then_consumed() {
        let mut reader = reader("04:AB:10:9F\r\n");
        assert!(reader.tag_available());

        let mut buf = [0u8; 10];
        assert_eq!(reader.read_tag(&mut buf), 4);
        assert_eq!(&buf[..4], &UID);
        assert_eq!(reader.read_tag(&mut buf), 0);
        assert!(!reader.tag_available());
    }

    #[test]
    fn test_read_without_tag_returns_zero() {
        let mut reader = reader("");
        let mut buf = [0xEEu8; 4];
        assert!(!reader.tag_available());
        assert_eq!(reader.read_tag(&mut buf), 0);
        assert_eq!(buf, [0xEE; 4]);
    }

    #[test]
    fn test_one_line_per_call() {
        let mut reader = reader("bad\n04:AB:10:9F\n");

        assert!(!reader.tag_available());
        assert_eq!(reader.source_mut().remaining(), 12);

        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);
    }

    #[test]
    fn test_empty_lines_skipped_within_call() {
        let mut reader = reader("\r\n\n   \n04:AB:10:9F\n");
        assert!(reader.tag_available());
    }

    #[test]
    fn test_buffered_tag_blocks_further_input() {
        let mut reader = reader("04:AB:10:9F\n11:22:33:44\n");

        assert!(reader.tag_available());
        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);

        assert!(reader.tag_available());
        assert_eq!(
            reader.take_tag().unwrap().as_bytes(),
            &[0x11, 0x22, 0x33, 0x44]
        );
    }

    #[test]
    fn test_partial_line_waits_for_terminator() {
        let mut reader = reader("04:AB:");
        assert!(!reader.tag_available());
        assert_eq!(reader.pending_len(), 6);

        reader.source_mut().push_line("10:9F");
        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);
    }

    #[test]
    fn test_overlong_line_discarded() {
        let noise = "x".repeat(70);
        let mut reader = reader(&format!("{noise}04:AB:10:9F\n"));

        // 65th character clears the buffer; the tail still holds the UID.
        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);
    }

    #[test]
    fn test_overlong_line_truncates_uid() {
        let mut reader = reader(&format!("{}04:AB:10:9F\n", "x".repeat(60)));

        // Overflow lands mid-UID, leaving too few pairs.
        assert!(!reader.tag_available());
        assert_eq!(reader.take_tag(), None);
    }

    #[test]
    fn test_sixty_four_characters_kept() {
        let line = format!("{}04AB109F", "x".repeat(56));
        assert_eq!(line.len(), 64);
        let mut reader = reader(&format!("{line}\n"));
        assert!(reader.tag_available());
    }

    #[test]
    fn test_short_buffer_truncates() {
        let mut reader = reader("04:AB:10:9F\n");
        assert!(reader.tag_available());

        let mut buf = [0u8; 3];
        assert_eq!(reader.read_tag(&mut buf), 3);
        assert_eq!(buf, [0x04, 0xAB, 0x10]);
        assert!(!reader.tag_available());
    }

    #[tokio::test]
    async fn test_channel_source_feeds_reader() {
        let (source, tx) = ChannelSource::new(8);
        let mut reader = SerialTagReader::new(source);
        assert!(!reader.tag_available());

        tx.send(Bytes::from_static(b"04:AB:")).await.unwrap();
        tx.send(Bytes::from_static(b"10:9F\n")).await.unwrap();

        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);
    }

    #[tokio::test]
    async fn test_channel_source_closed_sender() {
        let (mut source, tx) = ChannelSource::new(1);
        tx.send(Bytes::from_static(b"a")).await.unwrap();
        drop(tx);

        assert_eq!(source.next_byte(), Some(b'a'));
        assert_eq!(source.next_byte(), None);
    }
}

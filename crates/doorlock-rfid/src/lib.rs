//! Tag acquisition for the door lock core.
//!
//! Two interchangeable backends implement the [`TagReader`] contract:
//!
//! - [`SerialTagReader`]: parses identifiers typed as hex lines, for bring-up
//!   without a reader chip
//! - [`Mfrc522Reader`]: drives an MFRC522 over SPI through a [`RegisterLink`]
//!   and resolves 4-byte UIDs with REQA and Cascade Level 1 anticollision
//!
//! Both produce identical identifiers for the same card, and both report
//! every protocol or parse failure as "no tag this poll".
//!
//! ```
//! use doorlock_rfid::{AnyTagReader, ScriptedSource, SerialTagReader, TagReader};
//!
//! let source = ScriptedSource::from("04 AB 10 9F\n");
//! let mut reader = AnyTagReader::Scripted(SerialTagReader::new(source));
//!
//! while !reader.tag_available() {}
//! let tag = reader.take_tag().unwrap();
//! assert_eq!(tag.to_string(), "04:AB:10:9F");
//! ```

pub mod devices;
pub mod error;
pub mod mfrc522;
pub mod mock;
pub mod reader;
pub mod registers;
pub mod simulated;
pub mod transport;

pub use devices::AnyTagReader;
#[cfg(feature = "hardware-spi")]
pub use devices::RpiMfrc522Reader;
pub use error::{Result, RfidError};
pub use mfrc522::{Mfrc522Reader, Reception};
pub use reader::TagReader;
pub use simulated::{ByteSource, ChannelSource, ScriptedSource, SerialTagReader};
pub use transport::{ChipSelect, RegisterLink};

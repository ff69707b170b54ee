//! Enum wrapper for reader backend dispatch.
//!
//! The controller is generic over its [`TagReader`]. The binary chooses the
//! backend from configuration at start-up, so [`AnyTagReader`] dispatches
//! through a `match`. The live variant only exists with the `hardware-spi`
//! feature.

use crate::reader::TagReader;
use crate::simulated::{ChannelSource, ScriptedSource, SerialTagReader};

#[cfg(feature = "hardware-spi")]
use crate::mfrc522::Mfrc522Reader;
#[cfg(feature = "hardware-spi")]
use doorlock_hardware::{
    SystemClock,
    rpi::{RpiOutputPin, RpiSpi},
};

/// MFRC522 on Raspberry Pi SPI with GPIO chip select and reset.
#[cfg(feature = "hardware-spi")]
pub type RpiMfrc522Reader = Mfrc522Reader<RpiSpi, RpiOutputPin, RpiOutputPin, SystemClock>;

/// Enum wrapper for tag reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagReader {
    /// Simulated lines from an in-memory script.
    Scripted(SerialTagReader<ScriptedSource>),

    /// Simulated lines from a terminal feed.
    Serial(SerialTagReader<ChannelSource>),

    /// MFRC522 on the SPI bus.
    #[cfg(feature = "hardware-spi")]
    Live(Box<RpiMfrc522Reader>),
}

impl TagReader for AnyTagReader {
    fn tag_available(&mut self) -> bool {
        match self {
            Self::Scripted(reader) => reader.tag_available(),
            Self::Serial(reader) => reader.tag_available(),
            #[cfg(feature = "hardware-spi")]
            Self::Live(reader) => reader.tag_available(),
        }
    }

    fn read_tag(&mut self, buffer: &mut [u8]) -> usize {
        match self {
            Self::Scripted(reader) => reader.read_tag(buffer),
            Self::Serial(reader) => reader.read_tag(buffer),
            #[cfg(feature = "hardware-spi")]
            Self::Live(reader) => reader.read_tag(buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_reader_scripted() {
        let source = ScriptedSource::from("04:AB:10:9F\n");
        let mut any = AnyTagReader::Scripted(SerialTagReader::new(source));

        assert!(any.tag_available());
        assert_eq!(any.take_tag().unwrap().to_string(), "04:AB:10:9F");
        assert!(!any.tag_available());
    }

    #[test]
    fn test_any_reader_serial_idle() {
        let (source, _tx) = ChannelSource::new(4);
        let mut any = AnyTagReader::Serial(SerialTagReader::new(source));

        assert!(!any.tag_available());
        assert_eq!(any.read_tag(&mut [0u8; 4]), 0);
    }
}

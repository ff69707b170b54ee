//! Live reader: MFRC522 over SPI.
//!
//! Each `tag_available` poll runs one REQA / Cascade Level 1 anticollision
//! exchange:
//!
//! ```text
//! PCD                         PICC
//!  │── REQA 0x26 (7 bits) ──────>│
//!  │<───────────── ATQA (2 bytes)│
//!  │── SEL CL1 0x93, NVB 0x20 ──>│
//!  │<──── UID0 UID1 UID2 UID3 BCC│
//! ```
//!
//! The UID is accepted only if BCC equals the XOR of the four UID bytes.
//! Cards needing a second cascade level are not resolved.

use doorlock_core::TagIdentifier;
use doorlock_core::constants::{
    CRC_TIMEOUT_MS, NVB_NO_UID_BITS, PICC_CMD_REQA, PICC_CMD_SEL_CL1, TRANSCEIVE_TIMEOUT_MS,
    UID_LENGTH,
};
use doorlock_core::xor_fold;
use doorlock_hardware::{Clock, HardwareError, OutputPin, SpiTransfer};
use tracing::{debug, info, trace};

use crate::error::{Result, RfidError};
use crate::reader::{TagReader, TagSlot};
use crate::registers::{
    ANTENNA_ON, COM_IRQ_CLEAR_ALL, COM_IRQ_RX_OR_IDLE, DIV_IRQ_CRC, ERROR_MASK, FIFO_FLUSH,
    INIT_SEQUENCE, PcdCommand, RX_LAST_BITS_MASK, Register, SHORT_FRAME_BITS, START_SEND,
};
use crate::transport::RegisterLink;

/// Milliseconds to wait after a soft reset.
const SOFT_RESET_SETTLE_MS: u64 = 50;

/// Outcome of a successful transceive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reception {
    /// Bytes copied into the caller's buffer.
    pub len: usize,
    /// Valid bits in the last byte (0 means the whole byte is valid).
    pub valid_bits: u8,
}

/// MFRC522 [`TagReader`].
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::{MockClock, MockPin};
/// use doorlock_rfid::mock::MockRc522;
/// use doorlock_rfid::{Mfrc522Reader, RegisterLink, TagReader};
///
/// let (chip, card) = MockRc522::new();
/// let link = RegisterLink::new(chip, MockPin::new(), MockPin::new(), MockClock::new()).unwrap();
/// let mut reader = Mfrc522Reader::new(link);
/// reader.init().unwrap();
///
/// card.present_card([0x04, 0xAB, 0x10, 0x9F]);
/// assert!(reader.tag_available());
/// assert_eq!(reader.take_tag().unwrap().to_string(), "04:AB:10:9F");
/// ```
#[derive(Debug)]
pub struct Mfrc522Reader<S, CS, RST, C> {
    link: RegisterLink<S, CS, RST, C>,
    slot: TagSlot,
    version: Option<u8>,
}

impl<S, CS, RST, C> Mfrc522Reader<S, CS, RST, C>
where
    S: SpiTransfer,
    CS: OutputPin,
    RST: OutputPin,
    C: Clock,
{
    /// Wrap a link. Call [`init`](Self::init) before polling.
    pub fn new(link: RegisterLink<S, CS, RST, C>) -> Self {
        Self {
            link,
            slot: TagSlot::default(),
            version: None,
        }
    }

    /// Reset and configure the chip, switch the antenna on, and return the
    /// value of `VersionReg`.
    ///
    /// # Errors
    ///
    /// Returns `Link` if any register transaction fails.
    pub fn init(&mut self) -> Result<u8> {
        self.link.hard_reset()?;
        self.link
            .write_reg(Register::Command, PcdCommand::SoftReset.code())?;
        self.link.clock().delay_ms(SOFT_RESET_SETTLE_MS);

        for (reg, value) in INIT_SEQUENCE {
            self.link.write_reg(reg, value)?;
        }
        self.antenna_on()?;

        let version = self.link.read_reg(Register::Version)?;
        self.version = Some(version);
        info!("MFRC522 initialized, VersionReg=0x{version:02X}");
        Ok(version)
    }

    /// `VersionReg` as read by the last successful [`init`](Self::init).
    pub fn version(&self) -> Option<u8> {
        self.version
    }

    fn antenna_on(&mut self) -> Result<()> {
        let value = self.link.read_reg(Register::TxControl)?;
        if value & ANTENNA_ON != ANTENNA_ON {
            self.link.set_bits(Register::TxControl, ANTENNA_ON)?;
        }
        Ok(())
    }

    /// Send `data` to the card and collect its answer into `back`.
    ///
    /// The caller programs `BitFramingReg` TxLastBits beforehand.
    ///
    /// # Errors
    ///
    /// `Timeout` if no reception completes within 50 ms, `ChipError` if
    /// `ErrorReg` flags a buffer overflow, parity or protocol error,
    /// `FifoOverflow` if the answer does not fit in `back`.
    pub fn transceive(&mut self, data: &[u8], back: &mut [u8]) -> Result<Reception> {
        let link = &mut self.link;
        link.write_reg(Register::Command, PcdCommand::Idle.code())?;
        link.write_reg(Register::ComIrq, COM_IRQ_CLEAR_ALL)?;
        link.write_reg(Register::FifoLevel, FIFO_FLUSH)?;
        link.write_fifo(data)?;
        link.write_reg(Register::Command, PcdCommand::Transceive.code())?;
        link.set_bits(Register::BitFraming, START_SEND)?;

        match link.wait_for_bits(Register::ComIrq, COM_IRQ_RX_OR_IDLE, TRANSCEIVE_TIMEOUT_MS) {
            Ok(_) => {}
            Err(HardwareError::Timeout { .. }) => {
                link.clear_bits(Register::BitFraming, START_SEND)?;
                link.write_reg(Register::Command, PcdCommand::Idle.code())?;
                return Err(RfidError::Timeout {
                    operation: "transceive",
                    timeout_ms: TRANSCEIVE_TIMEOUT_MS,
                });
            }
            Err(e) => return Err(e.into()),
        }
        link.clear_bits(Register::BitFraming, START_SEND)?;

        let flags = link.read_reg(Register::Error)?;
        if flags & ERROR_MASK != 0 {
            return Err(RfidError::ChipError { flags });
        }

        let level = usize::from(link.read_reg(Register::FifoLevel)?);
        if level > back.len() {
            return Err(RfidError::FifoOverflow {
                level,
                capacity: back.len(),
            });
        }
        link.read_fifo(&mut back[..level])?;

        let valid_bits = link.read_reg(Register::Control)? & RX_LAST_BITS_MASK;
        Ok(Reception {
            len: level,
            valid_bits,
        })
    }

    /// Send REQA and return the ATQA.
    ///
    /// # Errors
    ///
    /// Any transceive failure, or `UnexpectedResponse` unless exactly two
    /// whole bytes come back.
    pub fn request_a(&mut self) -> Result<[u8; 2]> {
        self.link.write_reg(Register::BitFraming, SHORT_FRAME_BITS)?;
        let mut atqa = [0u8; 2];
        let reception = self.transceive(&[PICC_CMD_REQA], &mut atqa)?;
        if reception.len != atqa.len() || reception.valid_bits != 0 {
            return Err(RfidError::UnexpectedResponse {
                len: reception.len,
                valid_bits: reception.valid_bits,
            });
        }
        Ok(atqa)
    }

    /// Run Cascade Level 1 anticollision and return the checked UID.
    ///
    /// # Errors
    ///
    /// Any transceive failure, `UnexpectedResponse` unless exactly five bytes
    /// come back, `BccMismatch` if the check byte is wrong.
    pub fn anticollision_cl1(&mut self) -> Result<[u8; UID_LENGTH]> {
        self.link.write_reg(Register::BitFraming, 0x00)?;
        let mut back = [0u8; 10];
        let reception = self.transceive(&[PICC_CMD_SEL_CL1, NVB_NO_UID_BITS], &mut back)?;
        if reception.len != UID_LENGTH + 1 {
            return Err(RfidError::UnexpectedResponse {
                len: reception.len,
                valid_bits: reception.valid_bits,
            });
        }

        let uid = [back[0], back[1], back[2], back[3]];
        verify_bcc(&uid, back[UID_LENGTH])?;
        Ok(uid)
    }

    /// Compute CRC_A over `data` on the chip's coprocessor.
    ///
    /// Returns `[low, high]`, or `None` if the link fails or the result is not
    /// ready within 20 ms.
    pub fn calculate_crc(&mut self, data: &[u8]) -> Option<[u8; 2]> {
        match self.try_calculate_crc(data) {
            Ok(crc) => Some(crc),
            Err(e) => {
                debug!(error = %e, "CRC calculation failed");
                None
            }
        }
    }

    fn try_calculate_crc(&mut self, data: &[u8]) -> Result<[u8; 2]> {
        let link = &mut self.link;
        link.write_reg(Register::Command, PcdCommand::Idle.code())?;
        link.write_reg(Register::DivIrq, DIV_IRQ_CRC)?;
        link.write_reg(Register::FifoLevel, FIFO_FLUSH)?;
        link.write_fifo(data)?;
        link.write_reg(Register::Command, PcdCommand::CalcCrc.code())?;

        match link.wait_for_bits(Register::DivIrq, DIV_IRQ_CRC, CRC_TIMEOUT_MS) {
            Ok(_) => {}
            Err(HardwareError::Timeout { .. }) => {
                link.write_reg(Register::Command, PcdCommand::Idle.code())?;
                return Err(RfidError::Timeout {
                    operation: "CRC",
                    timeout_ms: CRC_TIMEOUT_MS,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let low = link.read_reg(Register::CrcResultL)?;
        let high = link.read_reg(Register::CrcResultH)?;
        Ok([low, high])
    }

    fn scan(&mut self) -> Result<TagIdentifier> {
        let atqa = self.request_a()?;
        trace!(?atqa, "card answered REQA");
        let uid = self.anticollision_cl1()?;
        Ok(TagIdentifier::from_uid4(uid))
    }
}

/// Check the anticollision Block Check Character.
///
/// # Errors
///
/// `BccMismatch` unless `bcc` equals the XOR of `uid`.
///
/// # Examples
///
/// ```
/// use doorlock_rfid::mfrc522::verify_bcc;
///
/// let uid = [0x04, 0xAB, 0x10, 0x9F];
/// assert!(verify_bcc(&uid, 0x04 ^ 0xAB ^ 0x10 ^ 0x9F).is_ok());
/// assert!(verify_bcc(&uid, 0x00).is_err());
/// ```
pub fn verify_bcc(uid: &[u8; UID_LENGTH], bcc: u8) -> Result<()> {
    let expected = xor_fold(uid);
    if expected == bcc {
        Ok(())
    } else {
        Err(RfidError::BccMismatch {
            expected,
            received: bcc,
        })
    }
}

impl<S, CS, RST, C> TagReader for Mfrc522Reader<S, CS, RST, C>
where
    S: SpiTransfer,
    CS: OutputPin,
    RST: OutputPin,
    C: Clock,
{
    fn tag_available(&mut self) -> bool {
        if self.slot.is_ready() {
            return true;
        }
        match self.scan() {
            Ok(tag) => {
                debug!(%tag, "card detected");
                self.slot.store(tag);
                true
            }
            Err(RfidError::Timeout { .. }) => false,
            Err(e) => {
                debug!(error = %e, "card exchange failed");
                false
            }
        }
    }

    fn read_tag(&mut self, buffer: &mut [u8]) -> usize {
        self.slot.copy_out(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MFRC522_V2_VERSION, MockRc522, MockRc522Handle};
    use doorlock_hardware::mock::{MockClock, MockPin};

    type TestReader = Mfrc522Reader<MockRc522, MockPin, MockPin, MockClock>;

    const UID: [u8; 4] = [0x04, 0xAB, 0x10, 0x9F];

    fn reader() -> (TestReader, MockRc522Handle, MockPin) {
        let cs = MockPin::new();
        let (chip, handle) = MockRc522::with_chip_select(cs.clone());
        let link =
            RegisterLink::new(chip, cs.clone(), MockPin::with_level(true), MockClock::new())
                .unwrap();
        let mut reader = Mfrc522Reader::new(link);
        reader.init().unwrap();
        (reader, handle, cs)
    }

    #[test]
    fn test_init_programs_chip() {
        let (reader, handle, cs) = reader();

        assert_eq!(reader.version(), Some(MFRC522_V2_VERSION));
        assert_eq!(handle.register(Register::TMode), 0x8D);
        assert_eq!(handle.register(Register::TPrescaler), 0x3E);
        assert_eq!(handle.register(Register::TReloadL), 30);
        assert_eq!(handle.register(Register::TxAsk), 0x40);
        assert_eq!(handle.register(Register::Mode), 0x3D);
        assert_eq!(handle.register(Register::TxControl) & ANTENNA_ON, ANTENNA_ON);
        assert!(cs.is_high());
        assert_eq!(handle.unselected_transfers(), 0);
    }

    #[test]
    fn test_antenna_not_rewritten_when_on() {
        let (mut reader, handle, _) = reader();
        assert_eq!(handle.tx_control_writes(), 1);

        reader.antenna_on().unwrap();
        assert_eq!(handle.tx_control_writes(), 1);
    }

    #[test]
    fn test_reads_presented_card() {
        let (mut reader, handle, cs) = reader();
        handle.present_card(UID);

        assert!(reader.tag_available());
        let mut buf = [0u8; 10];
        assert_eq!(reader.read_tag(&mut buf), 4);
        assert_eq!(&buf[..4], &UID);
        assert_eq!(reader.read_tag(&mut buf), 0);

        assert_eq!(
            handle.frames(),
            vec![vec![PICC_CMD_REQA], vec![PICC_CMD_SEL_CL1, NVB_NO_UID_BITS]]
        );
        assert!(cs.is_high());
        assert_eq!(handle.unselected_transfers(), 0);
    }

    #[test]
    fn test_no_card_times_out() {
        let (mut reader, handle, _) = reader();

        assert!(!reader.tag_available());
        assert!(matches!(
            reader.request_a(),
            Err(RfidError::Timeout { timeout_ms: 50, .. })
        ));
        assert_eq!(handle.register(Register::BitFraming) & START_SEND, 0);
        assert_eq!(
            handle.register(Register::Command),
            PcdCommand::Idle.code()
        );
    }

    #[test]
    fn test_corrupt_bcc_rejected() {
        let (mut reader, handle, _) = reader();
        handle.present_card(UID);
        handle.corrupt_bcc(0x01);

        assert!(!reader.tag_available());
        assert!(matches!(
            reader.anticollision_cl1(),
            Err(RfidError::BccMismatch { .. })
        ));
    }

    #[test]
    fn test_chip_error_flags_fail_exchange() {
        let (mut reader, handle, _) = reader();
        handle.present_card(UID);
        handle.set_error_flags(0x02);

        assert!(matches!(
            reader.request_a(),
            Err(RfidError::ChipError { flags: 0x02 })
        ));
        assert!(!reader.tag_available());
    }

    #[test]
    fn test_partial_byte_atqa_rejected() {
        let (mut reader, handle, _) = reader();
        handle.present_card(UID);
        handle.set_rx_last_bits(3);

        assert!(matches!(
            reader.request_a(),
            Err(RfidError::UnexpectedResponse { valid_bits: 3, .. })
        ));
    }

    #[test]
    fn test_link_failure_is_no_tag() {
        let (mut reader, handle, cs) = reader();
        handle.present_card(UID);
        handle.fail_transfers(true);

        assert!(!reader.tag_available());
        assert!(cs.is_high());
    }

    #[test]
    fn test_buffered_tag_survives_card_removal() {
        let (mut reader, handle, _) = reader();
        handle.present_card(UID);
        assert!(reader.tag_available());

        handle.remove_card();
        assert!(reader.tag_available());
        assert_eq!(reader.take_tag().unwrap().as_bytes(), &UID);
        assert!(!reader.tag_available());
    }

    #[test]
    fn test_calculate_crc() {
        let (mut reader, _, _) = reader();
        assert_eq!(reader.calculate_crc(&[0x50, 0x00]), Some([0x57, 0xCD]));
    }

    #[test]
    fn test_calculate_crc_timeout() {
        let (mut reader, handle, _) = reader();
        handle.stall_crc(true);

        assert_eq!(reader.calculate_crc(&[0x50, 0x00]), None);
        assert_eq!(
            handle.register(Register::Command),
            PcdCommand::Idle.code()
        );
    }
}

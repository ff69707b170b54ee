//! Register-level MFRC522 simulation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorlock_core::constants::{NVB_NO_UID_BITS, PICC_CMD_REQA, PICC_CMD_SEL_CL1};
use doorlock_core::xor_fold;
use doorlock_hardware::mock::MockPin;
use doorlock_hardware::{HardwareError, SpiTransfer};

use crate::registers::{
    COM_IRQ_RX_OR_IDLE, DIV_IRQ_CRC, FIFO_FLUSH, PcdCommand, Register, START_SEND,
};

/// Version byte reported by a genuine MFRC522 v2.0.
pub const MFRC522_V2_VERSION: u8 = 0x92;

const ATQA_MIFARE_CLASSIC: [u8; 2] = [0x04, 0x00];
const FIFO_CAPACITY: usize = 64;

#[derive(Debug)]
struct ChipState {
    regs: [u8; 64],
    fifo: VecDeque<u8>,
    card: Option<[u8; 4]>,
    bcc_flip: u8,
    atqa_valid_bits: u8,
    error_flags: u8,
    crc_stalled: bool,
    fail_transfers: bool,
    unselected_transfers: usize,
    tx_control_writes: usize,
    frames: Vec<Vec<u8>>,
}

impl ChipState {
    fn new() -> Self {
        let mut regs = [0u8; 64];
        regs[Register::Version.number() as usize] = MFRC522_V2_VERSION;
        Self {
            regs,
            fifo: VecDeque::new(),
            card: None,
            bcc_flip: 0,
            atqa_valid_bits: 0,
            error_flags: 0,
            crc_stalled: false,
            fail_transfers: false,
            unselected_transfers: 0,
            tx_control_writes: 0,
            frames: Vec::new(),
        }
    }

    fn reg(&self, reg: Register) -> u8 {
        self.regs[reg.number() as usize]
    }

    fn set_reg(&mut self, reg: Register, value: u8) {
        self.regs[reg.number() as usize] = value;
    }

    fn read(&mut self, number: u8) -> u8 {
        match number {
            n if n == Register::FifoData.number() => self.fifo.pop_front().unwrap_or(0),
            n if n == Register::FifoLevel.number() => self.fifo.len() as u8,
            n => self.regs[n as usize],
        }
    }

    fn write(&mut self, number: u8, value: u8) {
        match number {
            n if n == Register::FifoData.number() => {
                if self.fifo.len() < FIFO_CAPACITY {
                    self.fifo.push_back(value);
                }
            }
            n if n == Register::FifoLevel.number() => {
                if value & FIFO_FLUSH != 0 {
                    self.fifo.clear();
                }
            }
            n if n == Register::ComIrq.number() || n == Register::DivIrq.number() => {
                // Bit 7 selects whether the marked bits are set or cleared.
                let current = self.regs[n as usize];
                self.regs[n as usize] = if value & 0x80 != 0 {
                    current | (value & 0x7F)
                } else {
                    current & !value
                };
            }
            n if n == Register::Command.number() => {
                self.set_reg(Register::Command, value);
                self.on_command(value);
            }
            n if n == Register::BitFraming.number() => {
                self.set_reg(Register::BitFraming, value);
                let transceiving = self.reg(Register::Command) == PcdCommand::Transceive.code();
                if value & START_SEND != 0 && transceiving {
                    self.transceive(value & 0x07);
                }
            }
            n => {
                if n == Register::TxControl.number() {
                    self.tx_control_writes += 1;
                }
                self.regs[n as usize] = value;
            }
        }
    }

    fn on_command(&mut self, command: u8) {
        if command == PcdCommand::SoftReset.code() {
            let version = self.reg(Register::Version);
            self.regs = [0u8; 64];
            self.set_reg(Register::Version, version);
            self.fifo.clear();
        } else if command == PcdCommand::CalcCrc.code() && !self.crc_stalled {
            let data: Vec<u8> = self.fifo.drain(..).collect();
            let [low, high] = crc_a(&data);
            self.set_reg(Register::CrcResultL, low);
            self.set_reg(Register::CrcResultH, high);
            let div = self.reg(Register::DivIrq);
            self.set_reg(Register::DivIrq, div | DIV_IRQ_CRC);
        }
    }

    fn transceive(&mut self, tx_last_bits: u8) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        self.frames.push(frame.clone());

        let Some(uid) = self.card else {
            // No card in the field: the receiver never completes.
            return;
        };

        let response: Vec<u8> = match (frame.as_slice(), tx_last_bits) {
            ([cmd], 7) if *cmd == PICC_CMD_REQA => ATQA_MIFARE_CLASSIC.to_vec(),
            ([sel, nvb], 0) if *sel == PICC_CMD_SEL_CL1 && *nvb == NVB_NO_UID_BITS => {
                let mut out = uid.to_vec();
                out.push(xor_fold(&uid) ^ self.bcc_flip);
                out
            }
            _ => return,
        };

        self.fifo.extend(response);
        self.set_reg(Register::Error, self.error_flags);
        self.set_reg(Register::Control, self.atqa_valid_bits & 0x07);
        let irq = self.reg(Register::ComIrq);
        self.set_reg(Register::ComIrq, irq | COM_IRQ_RX_OR_IDLE);
    }
}

/// CRC_A (ISO/IEC 14443-3), low byte first.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut ch = byte ^ (crc as u8);
        ch ^= ch << 4;
        let ch = u16::from(ch);
        crc = (crc >> 8) ^ (ch << 8) ^ (ch << 3) ^ (ch >> 4);
    }
    crc.to_le_bytes()
}

/// Simulated MFRC522 on the SPI bus.
///
/// Decodes two-byte register transactions against an in-memory register
/// file and FIFO, and answers REQA and Cascade Level 1 anticollision when a
/// card is in the field. Returns a (MockRc522, MockRc522Handle) pair; the
/// handle places cards and injects faults.
///
/// # Examples
///
/// ```
/// use doorlock_rfid::mock::MockRc522;
///
/// let (chip, handle) = MockRc522::new();
/// handle.present_card([0x04, 0xAB, 0x10, 0x9F]);
/// assert!(handle.card_present());
/// # drop(chip);
/// ```
#[derive(Debug)]
pub struct MockRc522 {
    state: Arc<Mutex<ChipState>>,
    chip_select: Option<MockPin>,
}

impl MockRc522 {
    pub fn new() -> (Self, MockRc522Handle) {
        let state = Arc::new(Mutex::new(ChipState::new()));
        (
            Self {
                state: Arc::clone(&state),
                chip_select: None,
            },
            MockRc522Handle { state },
        )
    }

    /// Like [`MockRc522::new`], also watching `chip_select` so transfers made
    /// while it is high are counted.
    pub fn with_chip_select(chip_select: MockPin) -> (Self, MockRc522Handle) {
        let (mut chip, handle) = Self::new();
        chip.chip_select = Some(chip_select);
        (chip, handle)
    }
}

impl SpiTransfer for MockRc522 {
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> doorlock_hardware::Result<()> {
        let mut state = lock(&self.state);
        if state.fail_transfers {
            return Err(HardwareError::bus("injected SPI failure"));
        }
        if self.chip_select.as_ref().is_some_and(MockPin::is_high) {
            state.unselected_transfers += 1;
        }
        let len = buf.len();
        let [address, data] = buf else {
            return Err(HardwareError::invalid_data(format!(
                "expected 2-byte register frame, got {len}"
            )));
        };

        let number = (*address >> 1) & 0x3F;
        if *address & 0x80 != 0 {
            *data = state.read(number);
        } else {
            state.write(number, *data);
        }
        *address = 0;
        Ok(())
    }
}

/// Handle for controlling a [`MockRc522`].
#[derive(Debug, Clone)]
pub struct MockRc522Handle {
    state: Arc<Mutex<ChipState>>,
}

impl MockRc522Handle {
    /// Place a card with `uid` in the field.
    pub fn present_card(&self, uid: [u8; 4]) {
        lock(&self.state).card = Some(uid);
    }

    /// Take the card out of the field.
    pub fn remove_card(&self) {
        lock(&self.state).card = None;
    }

    pub fn card_present(&self) -> bool {
        lock(&self.state).card.is_some()
    }

    /// XOR `mask` into every BCC the chip sends back.
    pub fn corrupt_bcc(&self, mask: u8) {
        lock(&self.state).bcc_flip = mask;
    }

    /// Value the chip reports in `ControlReg` RxLastBits after a reception.
    pub fn set_rx_last_bits(&self, bits: u8) {
        lock(&self.state).atqa_valid_bits = bits;
    }

    /// Value the chip reports in `ErrorReg` after a reception.
    pub fn set_error_flags(&self, flags: u8) {
        lock(&self.state).error_flags = flags;
    }

    /// Never complete CRC calculations.
    pub fn stall_crc(&self, stalled: bool) {
        lock(&self.state).crc_stalled = stalled;
    }

    /// Fail every SPI transfer.
    pub fn fail_transfers(&self, fail: bool) {
        lock(&self.state).fail_transfers = fail;
    }

    /// Current value of `reg`, read without side effects.
    pub fn register(&self, reg: Register) -> u8 {
        lock(&self.state).reg(reg)
    }

    /// Frames handed to the transmitter, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        lock(&self.state).frames.clone()
    }

    /// Transfers made while chip select was released.
    pub fn unselected_transfers(&self) -> usize {
        lock(&self.state).unselected_transfers
    }

    /// Writes to `TxControlReg`.
    pub fn tx_control_writes(&self) -> usize {
        lock(&self.state).tx_control_writes
    }
}

fn lock(state: &Mutex<ChipState>) -> MutexGuard<'_, ChipState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

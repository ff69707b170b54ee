//! Register-level link to the reader chip.
//!
//! Every register access is one two-byte SPI transaction framed by chip
//! select:
//!
//! ```text
//! CS low ─ [address, data] ─ CS high
//! write:  address = 0XXXXXX0, data = value
//! read:   address = 1XXXXXX0, data = 0x00 (value returned in byte 2)
//! ```
//!
//! Chip select is driven by [`ChipSelect`], a scoped guard that releases the
//! line when dropped, so an aborted transfer never leaves the chip selected.

use doorlock_core::constants::RESET_SETTLE_MS;
use doorlock_hardware::{Clock, HardwareError, OutputPin, SpiTransfer};
use tracing::{trace, warn};

use crate::registers::Register;

type LinkResult<T> = std::result::Result<T, HardwareError>;

/// Scoped chip-select assertion.
///
/// Drives the line low on construction and high on drop.
#[derive(Debug)]
pub struct ChipSelect<'a, P: OutputPin> {
    pin: &'a mut P,
}

impl<'a, P: OutputPin> ChipSelect<'a, P> {
    /// Select the chip.
    pub fn assert(pin: &'a mut P) -> LinkResult<Self> {
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl<P: OutputPin> Drop for ChipSelect<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.pin.set_high() {
            warn!(error = %e, "failed to release chip select");
        }
    }
}

/// SPI register link to an MFRC522.
///
/// Owns the bus, the chip-select and reset lines, and the clock used for
/// bounded waits.
#[derive(Debug)]
pub struct RegisterLink<S, CS, RST, C> {
    spi: S,
    cs: CS,
    reset: RST,
    clock: C,
}

impl<S, CS, RST, C> RegisterLink<S, CS, RST, C>
where
    S: SpiTransfer,
    CS: OutputPin,
    RST: OutputPin,
    C: Clock,
{
    /// Build a link; chip select is released immediately.
    pub fn new(spi: S, mut cs: CS, reset: RST, clock: C) -> LinkResult<Self> {
        cs.set_high()?;
        Ok(Self {
            spi,
            cs,
            reset,
            clock,
        })
    }

    /// The clock used for bounded waits.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn transfer(&mut self, frame: &mut [u8; 2]) -> LinkResult<()> {
        let _selected = ChipSelect::assert(&mut self.cs)?;
        self.spi.transfer_in_place(frame)
    }

    pub fn write_reg(&mut self, reg: Register, value: u8) -> LinkResult<()> {
        let mut frame = [reg.write_address(), value];
        self.transfer(&mut frame)
    }

    pub fn read_reg(&mut self, reg: Register) -> LinkResult<u8> {
        let mut frame = [reg.read_address(), 0x00];
        self.transfer(&mut frame)?;
        Ok(frame[1])
    }

    /// Read-modify-write setting `mask`.
    pub fn set_bits(&mut self, reg: Register, mask: u8) -> LinkResult<()> {
        let value = self.read_reg(reg)?;
        self.write_reg(reg, value | mask)
    }

    /// Read-modify-write clearing `mask`.
    pub fn clear_bits(&mut self, reg: Register, mask: u8) -> LinkResult<()> {
        let value = self.read_reg(reg)?;
        self.write_reg(reg, value & !mask)
    }

    /// Push `data` into the FIFO one byte per transaction.
    pub fn write_fifo(&mut self, data: &[u8]) -> LinkResult<()> {
        for &byte in data {
            self.write_reg(Register::FifoData, byte)?;
        }
        Ok(())
    }

    /// Pop `buf.len()` bytes from the FIFO.
    pub fn read_fifo(&mut self, buf: &mut [u8]) -> LinkResult<()> {
        for slot in buf.iter_mut() {
            *slot = self.read_reg(Register::FifoData)?;
        }
        Ok(())
    }

    /// Pulse the reset line: low, settle, high, settle.
    pub fn hard_reset(&mut self) -> LinkResult<()> {
        self.reset.set_low()?;
        self.clock.delay_ms(RESET_SETTLE_MS);
        self.reset.set_high()?;
        self.clock.delay_ms(RESET_SETTLE_MS);
        trace!("reader reset pulse complete");
        Ok(())
    }

    /// Poll `reg` until any bit of `mask` is set.
    ///
    /// Returns the last register value, or `Timeout` once more than
    /// `timeout_ms` has elapsed. Polls are spaced one millisecond apart.
    pub fn wait_for_bits(&mut self, reg: Register, mask: u8, timeout_ms: u64) -> LinkResult<u8> {
        let start = self.clock.now_ms();
        loop {
            let value = self.read_reg(reg)?;
            if value & mask != 0 {
                return Ok(value);
            }
            if self.clock.now_ms().saturating_sub(start) > timeout_ms {
                return Err(HardwareError::timeout(timeout_ms));
            }
            self.clock.delay_ms(1);
        }
    }
}

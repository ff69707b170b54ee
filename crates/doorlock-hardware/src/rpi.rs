//! Raspberry Pi bindings (feature `hardware-spi`).
//!
//! Wraps `rppal` so the live reader, the lock outputs, and the supply-sense
//! input can run on a Pi header:
//!
//! - SPI0 MOSI/MISO/SCLK to the MFRC522
//! - a GPIO as chip select (driven explicitly per transaction)
//! - a GPIO as MFRC522 reset
//! - GPIOs for the lock output and status LED
//! - a pulled-up GPIO as the active-low power-fail input

use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::debug;

use crate::error::{HardwareError, Result};
use crate::traits::{EdgeCallback, EdgeSource, OutputPin, SpiTransfer};

/// SPI bus handle.
#[derive(Debug)]
pub struct RpiSpi {
    spi: Spi,
}

impl RpiSpi {
    /// Open SPI `bus` (0 or 1) at `clock_hz`, mode 0, MSB first.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the bus number is unknown or the
    /// device node cannot be opened.
    pub fn open(bus: u8, clock_hz: u32) -> Result<Self> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => {
                return Err(HardwareError::unavailable(format!(
                    "unsupported SPI bus {other}"
                )));
            }
        };
        let spi = Spi::new(bus, SlaveSelect::Ss0, clock_hz, Mode::Mode0)
            .map_err(|e| HardwareError::unavailable(e.to_string()))?;
        debug!(?bus, clock_hz, "SPI bus opened");
        Ok(Self { spi })
    }
}

impl SpiTransfer for RpiSpi {
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        let write = buf.to_vec();
        self.spi
            .transfer(buf, &write)
            .map_err(|e| HardwareError::bus(e.to_string()))?;
        Ok(())
    }
}

/// GPIO output line.
#[derive(Debug)]
pub struct RpiOutputPin {
    pin: rppal::gpio::OutputPin,
}

impl RpiOutputPin {
    /// Claim BCM pin `bcm` as an output, starting at `high`.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the GPIO chip or pin is unavailable.
    pub fn claim(bcm: u8, high: bool) -> Result<Self> {
        let mut pin = Gpio::new()
            .and_then(|gpio| gpio.get(bcm))
            .map_err(|e| HardwareError::unavailable(e.to_string()))?
            .into_output();
        pin.set_reset_on_drop(false);
        if high {
            pin.set_high();
        } else {
            pin.set_low();
        }
        Ok(Self { pin })
    }
}

impl OutputPin for RpiOutputPin {
    fn set_high(&mut self) -> Result<()> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<()> {
        self.pin.set_low();
        Ok(())
    }
}

/// Active-low supply-sense input.
#[derive(Debug)]
pub struct RpiPowerSense {
    pin: InputPin,
}

impl RpiPowerSense {
    /// Claim BCM pin `bcm` as a pulled-up input.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the GPIO chip or pin is unavailable.
    pub fn claim(bcm: u8) -> Result<Self> {
        let pin = Gpio::new()
            .and_then(|gpio| gpio.get(bcm))
            .map_err(|e| HardwareError::unavailable(e.to_string()))?
            .into_input_pullup();
        Ok(Self { pin })
    }
}

impl EdgeSource for RpiPowerSense {
    fn attach_falling_edge(&mut self, mut callback: EdgeCallback) -> Result<()> {
        self.pin
            .set_async_interrupt(Trigger::FallingEdge, move |_level: Level| callback())
            .map_err(|e| HardwareError::unavailable(e.to_string()))
    }
}

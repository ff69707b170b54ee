//! MFRC522 register map, PCD commands, and bit masks.
//!
//! Only the registers the access-control exchange touches are listed.

/// Reader chip registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    Command = 0x01,
    ComIrq = 0x04,
    DivIrq = 0x05,
    Error = 0x06,
    FifoData = 0x09,
    FifoLevel = 0x0A,
    Control = 0x0C,
    BitFraming = 0x0D,
    Mode = 0x11,
    TxMode = 0x12,
    RxMode = 0x13,
    TxControl = 0x14,
    TxAsk = 0x15,
    CrcResultH = 0x21,
    CrcResultL = 0x22,
    TMode = 0x2A,
    TPrescaler = 0x2B,
    TReloadH = 0x2C,
    TReloadL = 0x2D,
    Version = 0x37,
}

impl Register {
    /// Register number (0x00..=0x3F).
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// SPI address byte for a write: `0XXXXXX0`.
    pub const fn write_address(self) -> u8 {
        (self.number() << 1) & 0x7E
    }

    /// SPI address byte for a read: `1XXXXXX0`.
    pub const fn read_address(self) -> u8 {
        self.write_address() | 0x80
    }
}

/// Commands written to `CommandReg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PcdCommand {
    Idle = 0x00,
    CalcCrc = 0x03,
    Transceive = 0x0C,
    SoftReset = 0x0F,
}

impl PcdCommand {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Writing this to `ComIrqReg` clears every interrupt request bit.
pub const COM_IRQ_CLEAR_ALL: u8 = 0x7F;

/// `ComIrqReg` RxIRq | IdleIRq.
pub const COM_IRQ_RX_OR_IDLE: u8 = 0x30;

/// `DivIrqReg` CRCIRq.
pub const DIV_IRQ_CRC: u8 = 0x04;

/// `FIFOLevelReg` FlushBuffer.
pub const FIFO_FLUSH: u8 = 0x80;

/// `BitFramingReg` StartSend.
pub const START_SEND: u8 = 0x80;

/// `BitFramingReg` TxLastBits value for a 7-bit short frame.
pub const SHORT_FRAME_BITS: u8 = 0x07;

/// `ErrorReg` BufferOvfl | ParityErr | ProtocolErr.
pub const ERROR_MASK: u8 = 0x13;

/// `ControlReg` RxLastBits.
pub const RX_LAST_BITS_MASK: u8 = 0x07;

/// `TxControlReg` Tx1RFEn | Tx2RFEn.
pub const ANTENNA_ON: u8 = 0x03;

/// Power-on init values, written in this order after a soft reset.
pub const INIT_SEQUENCE: [(Register, u8); 8] = [
    (Register::TMode, 0x8D),
    (Register::TPrescaler, 0x3E),
    (Register::TReloadL, 30),
    (Register::TReloadH, 0),
    (Register::TxAsk, 0x40),
    (Register::Mode, 0x3D),
    (Register::TxMode, 0x00),
    (Register::RxMode, 0x00),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Register::Command, 0x02, 0x82)]
    #[case(Register::FifoData, 0x12, 0x92)]
    #[case(Register::BitFraming, 0x1A, 0x9A)]
    #[case(Register::Version, 0x6E, 0xEE)]
    fn test_address_bytes(#[case] reg: Register, #[case] write: u8, #[case] read: u8) {
        assert_eq!(reg.write_address(), write);
        assert_eq!(reg.read_address(), read);
    }

    #[rstest]
    #[case(PcdCommand::Idle, 0x00)]
    #[case(PcdCommand::CalcCrc, 0x03)]
    #[case(PcdCommand::Transceive, 0x0C)]
    #[case(PcdCommand::SoftReset, 0x0F)]
    fn test_command_codes(#[case] command: PcdCommand, #[case] code: u8) {
        assert_eq!(command.code(), code);
    }

    #[test]
    fn test_address_lsb_always_clear() {
        for reg in [Register::TReloadL, Register::Version, Register::CrcResultL] {
            assert_eq!(reg.write_address() & 0x01, 0);
            assert_eq!(reg.read_address() & 0x01, 0);
        }
    }
}

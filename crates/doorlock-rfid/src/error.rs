//! Error types for tag acquisition.
//!
//! Nothing here ever reaches the policy layer. Both reader backends turn
//! every variant into "no tag this poll" and log it; the types exist so the
//! protocol steps can be composed with `?` and tested individually.

use doorlock_hardware::HardwareError;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, RfidError>;

/// Reasons a protocol exchange or a simulated input line yielded no tag.
#[derive(Debug, thiserror::Error)]
pub enum RfidError {
    /// The register link itself failed.
    #[error("register link failure: {0}")]
    Link(#[from] HardwareError),

    /// A bounded wait on the reader chip expired.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// `ErrorReg` reported buffer overflow, parity, or protocol errors.
    #[error("reader chip error flags 0x{flags:02X}")]
    ChipError { flags: u8 },

    /// The chip buffered more bytes than the caller can accept.
    #[error("FIFO holds {level} bytes, capacity is {capacity}")]
    FifoOverflow { level: usize, capacity: usize },

    /// The response had the wrong shape for the command sent.
    #[error("unexpected response: {len} bytes, {valid_bits} valid bits in last byte")]
    UnexpectedResponse { len: usize, valid_bits: u8 },

    /// UID check byte did not match the XOR of the UID bytes.
    #[error("BCC mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    BccMismatch { expected: u8, received: u8 },

    /// A simulated input line held too few hex pairs for a UID.
    #[error("line holds {found} hex pairs, need at least {required}")]
    TooFewHexPairs { found: usize, required: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcc_mismatch_display() {
        let error = RfidError::BccMismatch {
            expected: 0x22,
            received: 0x23,
        };
        assert_eq!(
            error.to_string(),
            "BCC mismatch: expected 0x22, received 0x23"
        );
    }

    #[test]
    fn test_link_error_conversion() {
        let error: RfidError = HardwareError::bus("bus stuck").into();
        assert!(matches!(error, RfidError::Link(_)));
        assert!(error.to_string().contains("bus stuck"));
    }
}

//! Errors raised by the collaborators themselves.
//!
//! None of these stops the control loop. The reader turns them into "no tag
//! this poll"; the controller logs actuator failures and carries on.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// SPI transfer or GPIO write did not complete.
    #[error("bus transfer failed: {message}")]
    Bus { message: String },

    /// A bounded register poll ran past its deadline.
    #[error("no response within {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The device answered with something it should never send.
    #[error("unexpected data from device: {message}")]
    InvalidData { message: String },

    /// The bus, pin, or interrupt could not be claimed.
    #[error("device unavailable: {message}")]
    Unavailable { message: String },
}

impl HardwareError {
    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

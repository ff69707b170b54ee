//! `doorlock` configuration file.
//!
//! JSON, every field optional:
//!
//! ```json
//! {
//!   "max_wrong_attempts": 3,
//!   "lockout_seconds": 30,
//!   "unlock_hold_seconds": 5,
//!   "poll_interval_ms": 50,
//!   "storage_path": "doorlock.eeprom",
//!   "authorized_tags": ["04:AB:10:9F"],
//!   "reader": { "mode": "live", "spi_bus": 0, "chip_select_pin": 8, "reset_pin": 25 },
//!   "outputs": { "lock_pin": 17, "led_pin": 27, "power_sense_pin": 22 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use doorlock_controller::{AuthorizedTags, ControllerConfig, PolicyConfig};
use doorlock_core::constants::{DEFAULT_UNLOCK_HOLD_SECONDS, LOCKOUT_SECONDS, MAX_WRONG_ATTEMPTS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STORAGE_PATH: &str = "doorlock.eeprom";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// MFRC522 SPI clock, 4 MHz.
pub const DEFAULT_SPI_CLOCK_HZ: u32 = 4_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },

    #[error(transparent)]
    Invalid(#[from] doorlock_core::Error),
}

/// Tag acquisition backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReaderConfig {
    /// Hex lines typed on stdin.
    #[default]
    Simulated,

    /// MFRC522 on SPI.
    Live(LiveReaderConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveReaderConfig {
    #[serde(default)]
    pub spi_bus: u8,

    #[serde(default = "default_spi_clock_hz")]
    pub spi_clock_hz: u32,

    /// BCM numbers.
    pub chip_select_pin: u8,
    pub reset_pin: u8,
}

/// GPIO lines for the lock, its status LED, and the supply-sense input.
/// Without them, lock commands are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub lock_pin: u8,
    pub led_pin: u8,
    pub power_sense_pin: Option<u8>,
}

/// Everything the binary needs to run one door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoorConfig {
    pub max_wrong_attempts: u8,
    pub lockout_seconds: u8,
    pub unlock_hold_seconds: u16,
    pub poll_interval_ms: u64,
    pub storage_path: PathBuf,
    pub authorized_tags: Vec<String>,
    pub reader: ReaderConfig,
    pub outputs: Option<OutputConfig>,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            max_wrong_attempts: MAX_WRONG_ATTEMPTS,
            lockout_seconds: LOCKOUT_SECONDS,
            unlock_hold_seconds: DEFAULT_UNLOCK_HOLD_SECONDS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            authorized_tags: Vec::new(),
            reader: ReaderConfig::Simulated,
            outputs: None,
        }
    }
}

impl DoorConfig {
    /// Read and validate a configuration file.
    ///
    /// # Errors
    ///
    /// `Io` or `Parse` if the file cannot be used, otherwise the first
    /// validation failure.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first field that is out of range or the first
    /// authorized tag that does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::OutOfRange {
                field: "poll_interval_ms",
                reason: "must be at least 1",
            });
        }
        self.policy()?;
        self.authorized()?;
        Ok(())
    }

    pub fn policy(&self) -> Result<PolicyConfig, ConfigError> {
        Ok(PolicyConfig::new(
            self.max_wrong_attempts,
            self.lockout_seconds,
        )?)
    }

    pub fn controller(&self) -> Result<ControllerConfig, ConfigError> {
        Ok(ControllerConfig {
            policy: self.policy()?,
            unlock_hold_seconds: self.unlock_hold_seconds,
            ..ControllerConfig::default()
        })
    }

    pub fn authorized(&self) -> Result<AuthorizedTags, ConfigError> {
        Ok(AuthorizedTags::parse(&self.authorized_tags)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_spi_clock_hz() -> u32 {
    DEFAULT_SPI_CLOCK_HZ
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid tag identifier: {message}")]
    InvalidTagFormat { message: String },

    #[error("Invalid lock state code: {code}")]
    InvalidLockState { code: u8 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

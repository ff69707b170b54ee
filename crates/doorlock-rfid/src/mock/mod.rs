//! Test doubles for the reader chip.

mod rc522;

pub use rc522::{MFRC522_V2_VERSION, MockRc522, MockRc522Handle, crc_a};

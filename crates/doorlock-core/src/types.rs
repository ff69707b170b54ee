use crate::{
    Result,
    constants::{MAX_UID_LENGTH, UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;

/// XOR of every byte in `bytes`.
///
/// Used both for the anticollision Block Check Character and for the
/// persisted record checksum.
///
/// ```
/// use doorlock_core::xor_fold;
///
/// assert_eq!(xor_fold(&[0x04, 0xAB, 0x10, 0x9F]), 0x04 ^ 0xAB ^ 0x10 ^ 0x9F);
/// assert_eq!(xor_fold(&[]), 0);
/// ```
#[inline]
#[must_use]
pub fn xor_fold(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Identifier read from a proximity card (up to 10 bytes).
///
/// Stored inline so identifiers can be copied through the control loop
/// without allocating.
///
/// # Security
/// Equality is constant-time so authorized-list lookups do not leak how many
/// leading bytes of a presented identifier matched.
#[derive(Clone, Copy, Eq)]
pub struct TagIdentifier {
    bytes: [u8; MAX_UID_LENGTH],
    len: u8,
}

impl TagIdentifier {
    /// Create an identifier from raw bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidTagFormat` if `bytes` is empty or longer than 10.
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() || bytes.len() > MAX_UID_LENGTH {
            return Err(Error::InvalidTagFormat {
                message: format!(
                    "identifier must be 1-{MAX_UID_LENGTH} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        let mut buf = [0u8; MAX_UID_LENGTH];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    /// Create a 4-byte Cascade Level 1 identifier.
    #[must_use]
    pub fn from_uid4(uid: [u8; UID_LENGTH]) -> Self {
        let mut buf = [0u8; MAX_UID_LENGTH];
        buf[..UID_LENGTH].copy_from_slice(&uid);
        Self {
            bytes: buf,
            len: UID_LENGTH as u8,
        }
    }

    /// The identifier bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Number of identifier bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always `false`; an identifier holds at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Uppercase hex without separators, e.g. `04AB109F`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.as_bytes().iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl PartialEq for TagIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes().ct_eq(other.as_bytes()).into()
    }
}

impl std::hash::Hash for TagIdentifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Display for TagIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TagIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TagIdentifier({self})")
    }
}

/// Parses `04:AB:10:9F`, `04 ab 10 9f` or `04AB109F`.
///
/// Unlike the lenient serial reader, every character must be a hex digit or
/// one of the separators `:`, `-` and space, and the digit count must be even.
impl std::str::FromStr for TagIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits: Vec<u8> = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | ' '))
            .map(|c| {
                c.to_digit(16)
                    .map(|d| d as u8)
                    .ok_or_else(|| Error::InvalidTagFormat {
                        message: format!("'{c}' is not a hex digit in '{s}'"),
                    })
            })
            .collect::<Result<_>>()?;

        if digits.len() % 2 != 0 {
            return Err(Error::InvalidTagFormat {
                message: format!("odd number of hex digits in '{s}'"),
            });
        }

        let bytes: Vec<u8> = digits.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
        TagIdentifier::new(&bytes)
    }
}

impl Serialize for TagIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TagIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Physical lock state as stored in the security record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum LockState {
    #[default]
    Locked = 0,
    Unlocked = 1,
}

impl LockState {
    /// Decode a lock state byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidLockState` for anything other than 0 or 1.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(LockState::Locked),
            1 => Ok(LockState::Unlocked),
            _ => Err(Error::InvalidLockState { code: value }),
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockState::Locked => write!(f, "Locked"),
            LockState::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Command sent to the lock actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockCommand {
    Lock,
    Unlock,
}

impl LockCommand {
    /// The lock state this command produces.
    #[must_use]
    pub fn target_state(self) -> LockState {
        match self {
            LockCommand::Lock => LockState::Locked,
            LockCommand::Unlock => LockState::Unlocked,
        }
    }
}

impl From<LockState> for LockCommand {
    fn from(state: LockState) -> Self {
        match state {
            LockState::Locked => LockCommand::Lock,
            LockState::Unlocked => LockCommand::Unlock,
        }
    }
}

impl fmt::Display for LockCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockCommand::Lock => write!(f, "Lock"),
            LockCommand::Unlock => write!(f, "Unlock"),
        }
    }
}

//! Validated identifiers for seats and owners.
//!
//! Hosts receive ids as untrusted text; both types reject malformed input
//! with `InvalidInput` at construction.

use crate::error::ReservationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted length of an owner identifier, in bytes.
pub const MAX_OWNER_LEN: usize = 128;

/// Stable identifier of a seat.
///
/// Seats are numbered from 1 up to the configured seat count.
///
/// # Example
///
/// ```rust
/// use seatlock::core::SeatId;
///
/// let id: SeatId = "3".parse().unwrap();
/// assert_eq!(id, SeatId::new(3));
/// assert!("three".parse::<SeatId>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(u32);

impl SeatId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeatId {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ReservationError::InvalidInput(
                "seat id must not be empty".to_string(),
            ));
        }
        trimmed.parse::<u32>().map(Self).map_err(|_| {
            ReservationError::InvalidInput(format!("seat id '{trimmed}' is not a number"))
        })
    }
}

impl From<u32> for SeatId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Opaque identifier of the actor holding a lock or booking.
///
/// Surrounding whitespace is trimmed. The remaining value must be non-empty,
/// at most [`MAX_OWNER_LEN`] bytes, and free of control characters.
///
/// # Example
///
/// ```rust
/// use seatlock::core::OwnerId;
///
/// let owner = OwnerId::new("  alice ").unwrap();
/// assert_eq!(owner.as_str(), "alice");
/// assert!(OwnerId::new("   ").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Validate and wrap an owner identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ReservationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ReservationError::InvalidInput(
                "owner id must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_OWNER_LEN {
            return Err(ReservationError::InvalidInput(format!(
                "owner id exceeds {MAX_OWNER_LEN} bytes"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ReservationError::InvalidInput(
                "owner id contains control characters".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OwnerId {
    type Err = ReservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = ReservationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> Self {
        owner.0
    }
}

//! Seat status and the legal moves between statuses.
//!
//! All methods are pure. The status alone says nothing about who holds a
//! seat or until when; that lives on the record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible status of a seat.
///
/// # Example
///
/// ```rust
/// use seatlock::core::SeatStatus;
///
/// assert!(SeatStatus::Booked.is_final());
/// assert!(!SeatStatus::Booked.can_transition_to(SeatStatus::Available));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
}

impl SeatStatus {
    /// Get the status name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Locked => "Locked",
            Self::Booked => "Booked",
        }
    }

    /// Booked is terminal: cancellation is not part of this core.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Booked)
    }

    /// Check whether a committed write may move a seat from `self` to `next`.
    ///
    /// Staying put is always legal. Leaving `Booked` never is, and nothing
    /// jumps from `Available` straight to `Booked` without a lock.
    pub fn can_transition_to(&self, next: SeatStatus) -> bool {
        match (self, next) {
            (a, b) if *a == b => true,
            (a, _) if a.is_final() => false,
            (Self::Available, Self::Booked) => false,
            _ => true,
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

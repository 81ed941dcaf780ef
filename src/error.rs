//! Outcome taxonomy for reservation operations.
//!
//! Every business-rule refusal is an expected, recoverable value. The one
//! exception is [`InvariantViolation`], which signals a bug in this crate
//! rather than a caller mistake.

use crate::core::{SeatId, SeatStatus};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by seat operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("Seat {0} not found")]
    NotFound(SeatId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Seat {seat} is already booked")]
    AlreadyBooked { seat: SeatId },

    #[error("Seat {seat} is locked by another owner")]
    AlreadyLockedByOther { seat: SeatId },

    #[error("Seat {seat} is not locked")]
    NotLocked { seat: SeatId },

    #[error("Seat {seat} is held by a different owner")]
    NotOwner { seat: SeatId },

    #[error("Lock on seat {seat} has expired")]
    LockExpired { seat: SeatId },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl ReservationError {
    /// Discriminant for hosts mapping outcomes to transport responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::AlreadyBooked { .. } => ErrorKind::AlreadyBooked,
            Self::AlreadyLockedByOther { .. } => ErrorKind::AlreadyLockedByOther,
            Self::NotLocked { .. } => ErrorKind::NotLocked,
            Self::NotOwner { .. } => ErrorKind::NotOwner,
            Self::LockExpired { .. } => ErrorKind::LockExpired,
            Self::Invariant(_) => ErrorKind::Internal,
        }
    }

    /// True for programming errors, false for every business outcome.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

/// Flat, copyable classification of [`ReservationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    AlreadyBooked,
    AlreadyLockedByOther,
    NotLocked,
    NotOwner,
    LockExpired,
    Internal,
}

/// A seat was observed in, or about to enter, a state the model forbids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Seat {seat}: illegal transition from '{from}' to '{to}'")]
    IllegalTransition {
        seat: SeatId,
        from: SeatStatus,
        to: SeatStatus,
    },

    #[error("Seat {seat}: inconsistent snapshot ({detail})")]
    InconsistentSnapshot { seat: SeatId, detail: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_every_variant() {
        let seat = SeatId::new(1);
        let cases = [
            (ReservationError::NotFound(seat), ErrorKind::NotFound),
            (
                ReservationError::InvalidInput("x".to_string()),
                ErrorKind::InvalidInput,
            ),
            (ReservationError::AlreadyBooked { seat }, ErrorKind::AlreadyBooked),
            (
                ReservationError::AlreadyLockedByOther { seat },
                ErrorKind::AlreadyLockedByOther,
            ),
            (ReservationError::NotLocked { seat }, ErrorKind::NotLocked),
            (ReservationError::NotOwner { seat }, ErrorKind::NotOwner),
            (ReservationError::LockExpired { seat }, ErrorKind::LockExpired),
        ];

        for (error, kind) in cases {
            assert_eq!(error.kind(), kind);
            assert!(!error.is_invariant_violation());
        }
    }

    #[test]
    fn invariant_violation_is_distinct() {
        let error: ReservationError = InvariantViolation::IllegalTransition {
            seat: SeatId::new(2),
            from: SeatStatus::Booked,
            to: SeatStatus::Available,
        }
        .into();

        assert!(error.is_invariant_violation());
        assert_eq!(error.kind(), ErrorKind::Internal);
        assert_eq!(
            error.to_string(),
            "Seat 2: illegal transition from 'Booked' to 'Available'"
        );
    }

    #[test]
    fn messages_name_the_seat() {
        let error = ReservationError::LockExpired {
            seat: SeatId::new(3),
        };
        assert_eq!(error.to_string(), "Lock on seat 3 has expired");
    }
}

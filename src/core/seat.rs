//! Immutable seat snapshots handed to callers.

use super::ids::{OwnerId, SeatId};
use super::status::SeatStatus;
use crate::error::InvariantViolation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of a seat.
///
/// Snapshots are owned values; changing one never touches the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub status: SeatStatus,
    pub owner_id: Option<OwnerId>,
    pub lock_deadline: Option<DateTime<Utc>>,
}

impl Seat {
    /// A fresh, unheld seat.
    pub fn available(id: SeatId) -> Self {
        Self {
            id,
            status: SeatStatus::Available,
            owner_id: None,
            lock_deadline: None,
        }
    }

    /// Check the owner/deadline presence rules for this snapshot's status.
    ///
    /// # Example
    ///
    /// ```rust
    /// use seatlock::core::{Seat, SeatId, SeatStatus};
    ///
    /// let mut seat = Seat::available(SeatId::new(1));
    /// assert!(seat.validate().is_ok());
    ///
    /// seat.status = SeatStatus::Locked;
    /// assert!(seat.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let detail = match (self.status, &self.owner_id, &self.lock_deadline) {
            (SeatStatus::Available, None, None) => return Ok(()),
            (SeatStatus::Available, _, _) => "available seat carries an owner or deadline",
            (SeatStatus::Locked, Some(_), Some(_)) => return Ok(()),
            (SeatStatus::Locked, None, _) => "locked seat has no owner",
            (SeatStatus::Locked, _, None) => "locked seat has no deadline",
            (SeatStatus::Booked, Some(_), None) => return Ok(()),
            (SeatStatus::Booked, None, _) => "booked seat has no owner",
            (SeatStatus::Booked, _, Some(_)) => "booked seat still carries a deadline",
        };
        Err(InvariantViolation::InconsistentSnapshot {
            seat: self.id,
            detail,
        })
    }

    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        self.owner_id.as_ref() == Some(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerId {
        OwnerId::new("alice").unwrap()
    }

    #[test]
    fn valid_snapshots_pass() {
        let id = SeatId::new(1);
        let seats = [
            Seat::available(id),
            Seat {
                id,
                status: SeatStatus::Locked,
                owner_id: Some(owner()),
                lock_deadline: Some(Utc::now()),
            },
            Seat {
                id,
                status: SeatStatus::Booked,
                owner_id: Some(owner()),
                lock_deadline: None,
            },
        ];
        for seat in seats {
            assert!(seat.validate().is_ok(), "{seat:?}");
        }
    }

    #[test]
    fn inconsistent_snapshots_fail() {
        let id = SeatId::new(4);
        let seats = [
            Seat {
                id,
                status: SeatStatus::Available,
                owner_id: Some(owner()),
                lock_deadline: None,
            },
            Seat {
                id,
                status: SeatStatus::Locked,
                owner_id: None,
                lock_deadline: Some(Utc::now()),
            },
            Seat {
                id,
                status: SeatStatus::Booked,
                owner_id: Some(owner()),
                lock_deadline: Some(Utc::now()),
            },
        ];
        for seat in seats {
            let err = seat.validate().unwrap_err();
            assert!(matches!(
                err,
                InvariantViolation::InconsistentSnapshot { seat, .. } if seat == id
            ));
        }
    }

    #[test]
    fn ownership_check() {
        let seat = Seat {
            id: SeatId::new(2),
            status: SeatStatus::Booked,
            owner_id: Some(owner()),
            lock_deadline: None,
        };
        assert!(seat.is_owned_by(&owner()));
        assert!(!seat.is_owned_by(&OwnerId::new("bob").unwrap()));
        assert!(!Seat::available(SeatId::new(2)).is_owned_by(&owner()));
    }

    #[test]
    fn snapshot_serializes_flat() {
        let seat = Seat::available(SeatId::new(9));
        let json = serde_json::to_value(&seat).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["status"], "Available");
        assert!(json["owner_id"].is_null());
        assert!(json["lock_deadline"].is_null());
    }
}

//! Per-seat state container and its transitions.
//!
//! A [`SeatRecord`] is plain data: it does no locking and reads no clock.
//! Callers pass `now` in and must hold the seat's exclusive section (see
//! [`SeatStore::apply_transition`](crate::store::SeatStore::apply_transition))
//! while calling any `&mut self` method, which makes "check expiry, then act"
//! a single step.

use super::history::{ReclaimSource, SeatHistory, SeatTransition, TransitionCause};
use super::ids::{OwnerId, SeatId};
use super::seat::Seat;
use super::status::SeatStatus;
use crate::error::ReservationError;
use chrono::{DateTime, Utc};

/// Who holds a seat, and until when.
///
/// Owner and deadline live inside the variants, so a locked seat without an
/// owner cannot be represented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeatState {
    Available,
    Locked {
        owner: OwnerId,
        deadline: DateTime<Utc>,
    },
    Booked {
        owner: OwnerId,
    },
}

impl SeatState {
    pub fn status(&self) -> SeatStatus {
        match self {
            Self::Available => SeatStatus::Available,
            Self::Locked { .. } => SeatStatus::Locked,
            Self::Booked { .. } => SeatStatus::Booked,
        }
    }
}

/// Identifies one specific lock so a delayed reclamation can tell whether
/// the lock it was scheduled for is still the current one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockTicket {
    pub seat: SeatId,
    pub owner: OwnerId,
    pub deadline: DateTime<Utc>,
    pub generation: u64,
}

/// A lock that was taken back because its deadline passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reclaimed {
    pub seat: SeatId,
    pub owner: OwnerId,
    pub deadline: DateTime<Utc>,
    pub generation: u64,
    pub source: ReclaimSource,
}

/// Successful lock acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockGranted {
    pub seat: Seat,
    pub ticket: LockTicket,
    /// Expired lock that was reclaimed as part of this acquisition.
    pub reclaimed: Option<Reclaimed>,
}

/// What [`SeatRecord::restore`] needs to undo a write.
#[derive(Clone, Debug)]
pub(crate) struct Checkpoint {
    state: SeatState,
    generation: u64,
    recorded: u64,
}

impl Checkpoint {
    pub(crate) fn status(&self) -> SeatStatus {
        self.state.status()
    }
}

/// The mutable record behind one seat.
#[derive(Clone, Debug)]
pub struct SeatRecord {
    id: SeatId,
    state: SeatState,
    generation: u64,
    history: SeatHistory,
}

impl SeatRecord {
    pub fn new(id: SeatId, history_limit: usize) -> Self {
        Self {
            id,
            state: SeatState::Available,
            generation: 0,
            history: SeatHistory::with_limit(history_limit),
        }
    }

    pub fn id(&self) -> SeatId {
        self.id
    }

    pub fn state(&self) -> &SeatState {
        &self.state
    }

    pub fn status(&self) -> SeatStatus {
        self.state.status()
    }

    /// Number of locks ever granted on this seat.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation of the current lock, if the seat is locked.
    pub fn lock_generation(&self) -> Option<u64> {
        matches!(self.state, SeatState::Locked { .. }).then_some(self.generation)
    }

    pub fn history(&self) -> &SeatHistory {
        &self.history
    }

    pub fn snapshot(&self) -> Seat {
        let (owner_id, lock_deadline) = match &self.state {
            SeatState::Available => (None, None),
            SeatState::Locked { owner, deadline } => (Some(owner.clone()), Some(*deadline)),
            SeatState::Booked { owner } => (Some(owner.clone()), None),
        };
        Seat {
            id: self.id,
            status: self.status(),
            owner_id,
            lock_deadline,
        }
    }

    /// Whether the seat is locked with a deadline at or before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(&self.state, SeatState::Locked { deadline, .. } if *deadline <= now)
    }

    /// Return an expired lock to `Available`.
    pub fn reclaim_if_expired(
        &mut self,
        now: DateTime<Utc>,
        source: ReclaimSource,
    ) -> Option<Reclaimed> {
        if !self.is_expired(now) {
            return None;
        }
        self.reclaim(now, source)
    }

    /// Reclaim on behalf of a scheduled callback.
    ///
    /// Only acts if `ticket` still describes the current lock and its deadline
    /// has passed; a stale or early callback leaves the seat untouched.
    pub fn reclaim_for_ticket(
        &mut self,
        ticket: &LockTicket,
        now: DateTime<Utc>,
    ) -> Option<Reclaimed> {
        let current = matches!(
            &self.state,
            SeatState::Locked { owner, deadline }
                if *owner == ticket.owner && *deadline == ticket.deadline
        );
        if !current || self.generation != ticket.generation || ticket.deadline > now {
            return None;
        }
        self.reclaim(now, ReclaimSource::Scheduled)
    }

    /// Place a time-bounded lock on the seat for `owner`.
    ///
    /// An expired lock is reclaimed first, within the same call, so the new
    /// owner takes over directly. A live lock of the same owner is refreshed
    /// only when `allow_refresh` is set.
    pub fn lock(
        &mut self,
        owner: &OwnerId,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
        allow_refresh: bool,
    ) -> Result<LockGranted, ReservationError> {
        if ttl <= chrono::Duration::zero() {
            return Err(ReservationError::InvalidInput(
                "lock duration must be positive".to_string(),
            ));
        }
        let deadline = now.checked_add_signed(ttl).ok_or_else(|| {
            ReservationError::InvalidInput("lock duration is out of range".to_string())
        })?;

        let reclaimed = self.reclaim_if_expired(now, ReclaimSource::Lazy);

        let cause = match &self.state {
            SeatState::Available => TransitionCause::Locked,
            SeatState::Booked { .. } => {
                return Err(ReservationError::AlreadyBooked { seat: self.id })
            }
            SeatState::Locked { owner: holder, .. } if allow_refresh && holder == owner => {
                TransitionCause::Refreshed
            }
            SeatState::Locked { .. } => {
                return Err(ReservationError::AlreadyLockedByOther { seat: self.id })
            }
        };

        let from = self.status();
        self.generation += 1;
        self.state = SeatState::Locked {
            owner: owner.clone(),
            deadline,
        };
        self.history.record(SeatTransition {
            from,
            to: SeatStatus::Locked,
            owner: owner.clone(),
            at: now,
            cause,
        });

        Ok(LockGranted {
            seat: self.snapshot(),
            ticket: LockTicket {
                seat: self.id,
                owner: owner.clone(),
                deadline,
                generation: self.generation,
            },
            reclaimed,
        })
    }

    /// Turn the owner's live lock into a permanent booking.
    ///
    /// An expired lock is reclaimed and the call fails with `LockExpired`,
    /// whoever the caller is.
    pub fn confirm(&mut self, owner: &OwnerId, now: DateTime<Utc>) -> Result<Seat, ReservationError> {
        let seat = self.id;
        match &self.state {
            SeatState::Available => Err(ReservationError::NotLocked { seat }),
            SeatState::Booked { .. } => Err(ReservationError::AlreadyBooked { seat }),
            SeatState::Locked { deadline, .. } if *deadline <= now => {
                self.reclaim(now, ReclaimSource::Lazy);
                Err(ReservationError::LockExpired { seat })
            }
            SeatState::Locked { owner: holder, .. } if holder != owner => {
                Err(ReservationError::NotOwner { seat })
            }
            SeatState::Locked { .. } => {
                self.state = SeatState::Booked {
                    owner: owner.clone(),
                };
                self.history.record(SeatTransition {
                    from: SeatStatus::Locked,
                    to: SeatStatus::Booked,
                    owner: owner.clone(),
                    at: now,
                    cause: TransitionCause::Confirmed,
                });
                Ok(self.snapshot())
            }
        }
    }

    /// Drop the owner's live lock.
    pub fn release(&mut self, owner: &OwnerId, now: DateTime<Utc>) -> Result<(), ReservationError> {
        self.reclaim_if_expired(now, ReclaimSource::Lazy);

        let seat = self.id;
        match &self.state {
            SeatState::Available | SeatState::Booked { .. } => {
                Err(ReservationError::NotLocked { seat })
            }
            SeatState::Locked { owner: holder, .. } if holder != owner => {
                Err(ReservationError::NotOwner { seat })
            }
            SeatState::Locked { .. } => {
                self.state = SeatState::Available;
                self.history.record(SeatTransition {
                    from: SeatStatus::Locked,
                    to: SeatStatus::Available,
                    owner: owner.clone(),
                    at: now,
                    cause: TransitionCause::Released,
                });
                Ok(())
            }
        }
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            generation: self.generation,
            recorded: self.history.recorded(),
        }
    }

    /// Return to `checkpoint`, dropping history recorded since.
    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.state = checkpoint.state;
        self.generation = checkpoint.generation;
        self.history.discard_since(checkpoint.recorded);
    }

    /// Overwrite the state without any guard. Lets store tests provoke
    /// writes the transition methods never produce.
    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: SeatState) {
        self.state = state;
    }

    fn reclaim(&mut self, now: DateTime<Utc>, source: ReclaimSource) -> Option<Reclaimed> {
        if !matches!(self.state, SeatState::Locked { .. }) {
            return None;
        }
        let SeatState::Locked { owner, deadline } =
            std::mem::replace(&mut self.state, SeatState::Available)
        else {
            return None;
        };
        self.history.record(SeatTransition {
            from: SeatStatus::Locked,
            to: SeatStatus::Available,
            owner: owner.clone(),
            at: now,
            cause: TransitionCause::Expired(source),
        });
        Some(Reclaimed {
            seat: self.id,
            owner,
            deadline,
            generation: self.generation,
            source,
        })
    }
}

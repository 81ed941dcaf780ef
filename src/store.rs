//! Owner of every seat record.
//!
//! The seat table is fixed at construction: a `Vec` of per-seat mutexes that
//! is never resized, so looking up a seat takes no table-wide lock and two
//! different seats never contend.

use crate::clock::Clock;
use crate::core::{
    ReclaimSource, Reclaimed, Seat, SeatId, SeatRecord, SeatStatus, SeatTransition,
};
use crate::error::{InvariantViolation, ReservationError};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

/// Seat counts by status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilitySummary {
    pub total: usize,
    pub available: usize,
    pub locked: usize,
    pub booked: usize,
}

/// Collection of seat records with atomic per-seat mutation.
#[derive(Debug)]
pub struct SeatStore {
    seats: Vec<Mutex<SeatRecord>>,
}

impl SeatStore {
    /// Create `seat_count` available seats with ids `1..=seat_count`.
    pub fn new(seat_count: u32, history_limit: usize) -> Self {
        let seats = (1..=seat_count)
            .map(|raw| Mutex::new(SeatRecord::new(SeatId::new(raw), history_limit)))
            .collect();
        Self { seats }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// All seat ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = SeatId> + '_ {
        (1..=self.seats.len()).map(|raw| SeatId::new(raw as u32))
    }

    /// Raw snapshot of a seat, without expiry reclamation.
    pub fn get(&self, id: SeatId) -> Result<Seat, ReservationError> {
        Ok(self.lock_slot(id)?.snapshot())
    }

    /// Raw snapshots of every seat in ascending id order.
    pub fn list(&self) -> Vec<Seat> {
        self.seats
            .iter()
            .map(|slot| Self::guard(slot).snapshot())
            .collect()
    }

    /// Retained transitions of a seat, oldest first.
    pub fn history(&self, id: SeatId) -> Result<Vec<SeatTransition>, ReservationError> {
        Ok(self.lock_slot(id)?.history().transitions().cloned().collect())
    }

    /// Run `f` against a seat's record under that seat's exclusive section.
    ///
    /// No other operation on the same seat observes the record until `f`
    /// returns. Whatever `f` leaves behind is committed, including changes
    /// made before it returned an error (for example a lazy reclamation),
    /// unless the status change is illegal: then the record is restored and
    /// an [`InvariantViolation`] is returned instead.
    pub fn apply_transition<T, F>(&self, id: SeatId, f: F) -> Result<T, ReservationError>
    where
        F: FnOnce(&mut SeatRecord) -> Result<T, ReservationError>,
    {
        let mut record = self.lock_slot(id)?;
        let checkpoint = record.checkpoint();

        let result = f(&mut *record);

        let (from, to) = (checkpoint.status(), record.status());
        if !from.can_transition_to(to) {
            record.restore(checkpoint);
            error!(seat = %id, %from, %to, "rolled back illegal seat transition");
            return Err(InvariantViolation::IllegalTransition { seat: id, from, to }.into());
        }
        result
    }

    /// Reclaim every lock whose deadline has passed.
    ///
    /// Each seat is visited under its own section, and `clock` is read once
    /// that section is held; the table is never locked as a whole.
    pub fn reclaim_expired(&self, clock: &dyn Clock) -> Vec<Reclaimed> {
        let reclaimed: Vec<Reclaimed> = self
            .seats
            .iter()
            .filter_map(|slot| {
                let mut record = Self::guard(slot);
                record.reclaim_if_expired(clock.now(), ReclaimSource::Sweep)
            })
            .collect();
        if !reclaimed.is_empty() {
            debug!(count = reclaimed.len(), "swept expired seat locks");
        }
        reclaimed
    }

    /// Raw status counts, without expiry reclamation.
    pub fn summary(&self) -> AvailabilitySummary {
        self.seats.iter().fold(
            AvailabilitySummary {
                total: self.seats.len(),
                ..AvailabilitySummary::default()
            },
            |mut summary, slot| {
                match Self::guard(slot).status() {
                    SeatStatus::Available => summary.available += 1,
                    SeatStatus::Locked => summary.locked += 1,
                    SeatStatus::Booked => summary.booked += 1,
                }
                summary
            },
        )
    }

    fn slot(&self, id: SeatId) -> Result<&Mutex<SeatRecord>, ReservationError> {
        id.get()
            .checked_sub(1)
            .and_then(|index| self.seats.get(index as usize))
            .ok_or(ReservationError::NotFound(id))
    }

    fn lock_slot(&self, id: SeatId) -> Result<MutexGuard<'_, SeatRecord>, ReservationError> {
        self.slot(id).map(Self::guard)
    }

    // A poisoned seat still holds its last committed record: transitions
    // only write after their guards pass.
    fn guard(slot: &Mutex<SeatRecord>) -> MutexGuard<'_, SeatRecord> {
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Public operation surface of the reservation core.

use crate::clock::{to_offset, Clock};
use crate::config::{validate_ttl, ConfigError, ReservationConfig};
use crate::core::{OwnerId, ReclaimSource, Seat, SeatId, SeatRecord, SeatStatus, SeatTransition};
use crate::error::ReservationError;
use crate::expiry::{ExpiryScheduler, Sweeper};
use crate::store::{AvailabilitySummary, SeatStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Acknowledgement of a released lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Released {
    pub seat: SeatId,
    pub owner: OwnerId,
}

/// Seat reservation service.
///
/// Owns the seat table, the clock, and the expiry machinery. All operations
/// take `&self` and may be called concurrently from any thread; each one
/// returns immediately with a snapshot or a typed refusal.
///
/// Active expiry and the sweeper run on the tokio runtime that is current
/// when the service is created. Outside a runtime they are skipped and locks
/// expire lazily.
///
/// # Example
///
/// ```rust
/// use seatlock::clock::ManualClock;
/// use seatlock::config::ReservationConfig;
/// use seatlock::core::{OwnerId, SeatId, SeatStatus};
/// use seatlock::{ErrorKind, ReservationService};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::at_epoch());
/// let config = ReservationConfig::builder().seat_count(5).build().unwrap();
/// let service = ReservationService::new(config, clock.clone()).unwrap();
///
/// let alice = OwnerId::new("alice").unwrap();
/// let bob = OwnerId::new("bob").unwrap();
/// let seat = SeatId::new(3);
///
/// service.lock_seat(seat, &alice).unwrap();
/// let err = service.lock_seat(seat, &bob).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::AlreadyLockedByOther);
///
/// clock.advance(Duration::from_secs(61));
/// let err = service.confirm_seat(seat, &alice).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::LockExpired);
/// assert_eq!(service.get_seat(seat).unwrap().status, SeatStatus::Available);
/// ```
#[derive(Debug)]
pub struct ReservationService {
    config: ReservationConfig,
    store: Arc<SeatStore>,
    clock: Arc<dyn Clock>,
    scheduler: ExpiryScheduler,
    sweeper: Option<Sweeper>,
}

impl ReservationService {
    /// Validate `config`, create its seats, and start the expiry machinery.
    pub fn new(config: ReservationConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let store = Arc::new(SeatStore::new(config.seat_count, config.history_limit));
        let runtime = Handle::try_current().ok();

        let scheduler = match (&runtime, config.active_expiry) {
            (Some(handle), true) => ExpiryScheduler::with_runtime(
                Arc::clone(&store),
                Arc::clone(&clock),
                config.expiry_grace,
                handle.clone(),
            ),
            (None, true) => {
                warn!("active lock expiry requested outside a tokio runtime; relying on lazy expiry");
                ExpiryScheduler::disabled(Arc::clone(&store), Arc::clone(&clock))
            }
            (_, false) => ExpiryScheduler::disabled(Arc::clone(&store), Arc::clone(&clock)),
        };

        let sweeper = match (config.sweep_interval, &runtime) {
            (Some(interval), Some(handle)) => Some(Sweeper::spawn(
                Arc::clone(&store),
                Arc::clone(&clock),
                interval,
                handle,
            )),
            (Some(_), None) => {
                warn!("sweep interval set outside a tokio runtime; sweeper not started");
                None
            }
            (None, _) => None,
        };

        info!(
            seats = config.seat_count,
            lock_ttl_ms = config.lock_ttl.as_millis() as u64,
            active_expiry = scheduler.is_active(),
            sweeper = sweeper.is_some(),
            "reservation service started"
        );

        Ok(Self {
            config,
            store,
            clock,
            scheduler,
            sweeper,
        })
    }

    /// Service with [`ReservationConfig::default`].
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        Self::new(ReservationConfig::default(), clock)
    }

    pub fn config(&self) -> &ReservationConfig {
        &self.config
    }

    /// Snapshots of every seat in ascending id order.
    ///
    /// Expired locks are reclaimed before their seat is copied, so no
    /// returned seat is `Locked` past its deadline.
    pub fn list_seats(&self) -> Vec<Seat> {
        let mut seats = Vec::with_capacity(self.store.len());
        for id in self.store.ids() {
            match self.read(id) {
                Ok(seat) => seats.push(seat),
                Err(err) => error!(seat = %id, error = %err, "failed to read seat"),
            }
        }
        seats
    }

    pub fn get_seat(&self, id: SeatId) -> Result<Seat, ReservationError> {
        self.read(id)
    }

    /// Lock a seat for the configured TTL.
    pub fn lock_seat(&self, id: SeatId, owner: &OwnerId) -> Result<Seat, ReservationError> {
        self.lock_seat_for(id, owner, self.config.lock_ttl)
    }

    /// Lock a seat for `ttl`.
    pub fn lock_seat_for(
        &self,
        id: SeatId,
        owner: &OwnerId,
        ttl: Duration,
    ) -> Result<Seat, ReservationError> {
        validate_ttl(ttl).map_err(|err| ReservationError::InvalidInput(err.to_string()))?;
        let ttl = to_offset(ttl).ok_or_else(|| {
            ReservationError::InvalidInput("lock duration is out of range".to_string())
        })?;
        let allow_refresh = self.config.allow_owner_refresh;

        let granted = self.transition(id, |record, now| record.lock(owner, now, ttl, allow_refresh))?;

        if let Some(previous) = &granted.reclaimed {
            debug!(
                seat = %id,
                previous_owner = %previous.owner,
                "expired lock reclaimed on re-lock"
            );
        }
        debug!(
            seat = %id,
            owner = %owner,
            deadline = %granted.ticket.deadline,
            generation = granted.ticket.generation,
            "seat locked"
        );
        self.scheduler.schedule(granted.ticket);
        Ok(granted.seat)
    }

    /// Turn the caller's live lock into a booking.
    pub fn confirm_seat(&self, id: SeatId, owner: &OwnerId) -> Result<Seat, ReservationError> {
        let result = self.transition(id, |record, now| record.confirm(owner, now));
        match &result {
            Ok(_) => info!(seat = %id, owner = %owner, "seat booked"),
            Err(ReservationError::LockExpired { .. }) => {
                debug!(seat = %id, owner = %owner, "confirmation after lock expiry")
            }
            Err(_) => {}
        }
        result
    }

    /// Drop the caller's live lock.
    pub fn release_seat(&self, id: SeatId, owner: &OwnerId) -> Result<Released, ReservationError> {
        self.transition(id, |record, now| record.release(owner, now))?;
        debug!(seat = %id, owner = %owner, "seat released");
        Ok(Released {
            seat: id,
            owner: owner.clone(),
        })
    }

    /// Retained transitions of a seat, oldest first, after lazy reclamation.
    pub fn seat_history(&self, id: SeatId) -> Result<Vec<SeatTransition>, ReservationError> {
        self.read(id)?;
        self.store.history(id)
    }

    /// Status counts across all seats, after lazy reclamation.
    pub fn availability(&self) -> AvailabilitySummary {
        let seats = self.list_seats();
        let mut summary = AvailabilitySummary {
            total: seats.len(),
            ..AvailabilitySummary::default()
        };
        for seat in &seats {
            match seat.status {
                SeatStatus::Available => summary.available += 1,
                SeatStatus::Locked => summary.locked += 1,
                SeatStatus::Booked => summary.booked += 1,
            }
        }
        summary
    }

    /// Scheduled reclamation callbacks still outstanding.
    pub fn pending_expiries(&self) -> usize {
        self.scheduler.pending()
    }

    /// Stop the sweeper and abort every scheduled reclamation.
    ///
    /// Operations keep working afterwards with lazy expiry only.
    pub fn shutdown(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.shutdown();
        }
        self.scheduler.shutdown();
        info!("reservation service shut down");
    }

    fn read(&self, id: SeatId) -> Result<Seat, ReservationError> {
        self.transition(id, |record, now| {
            record.reclaim_if_expired(now, ReclaimSource::Lazy);
            Ok(record.snapshot())
        })
    }

    /// Run `op` on a seat under its exclusive section and cancel the expiry
    /// callback of any lock the seat left along the way.
    ///
    /// The clock is read only once the section is held, so `op` judges expiry
    /// against the instant its write commits.
    fn transition<T, F>(&self, id: SeatId, op: F) -> Result<T, ReservationError>
    where
        F: FnOnce(&mut SeatRecord, DateTime<Utc>) -> Result<T, ReservationError>,
    {
        let (result, departed) = self.store.apply_transition(id, |record| {
            let now = self.clock.now();
            let before = record.lock_generation();
            let result = op(record, now);
            let departed = before.filter(|generation| record.lock_generation() != Some(*generation));
            Ok((result, departed))
        })?;

        if let Some(generation) = departed {
            self.scheduler.cancel(id, generation);
        }
        result
    }
}

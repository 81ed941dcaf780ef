//! One reclamation callback per lock.

use crate::clock::Clock;
use crate::core::{LockTicket, SeatId};
use crate::store::SeatStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Schedules active reclamation of locks shortly after their deadline.
///
/// Each seat has at most one pending callback, tagged with the lock
/// generation it was scheduled for. A callback only reclaims if its ticket
/// still matches the seat's current lock and the clock says the deadline has
/// passed, so a callback that outlives its lock is harmless.
///
/// Callbacks run on the tokio runtime handle the scheduler was built with.
/// A [disabled](ExpiryScheduler::disabled) scheduler never schedules, and
/// expiry falls back to lazy reclamation.
#[derive(Debug)]
pub struct ExpiryScheduler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: Arc<SeatStore>,
    clock: Arc<dyn Clock>,
    grace: Duration,
    runtime: Option<Handle>,
    tasks: Mutex<Tasks>,
}

#[derive(Debug, Default)]
struct Tasks {
    closed: bool,
    pending: HashMap<SeatId, Pending>,
}

#[derive(Debug)]
struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

impl ExpiryScheduler {
    /// Build a scheduler that spawns its callbacks on `runtime`.
    pub fn with_runtime(
        store: Arc<SeatStore>,
        clock: Arc<dyn Clock>,
        grace: Duration,
        runtime: Handle,
    ) -> Self {
        Self::build(store, clock, grace, Some(runtime))
    }

    /// Build a scheduler that never schedules anything.
    pub fn disabled(store: Arc<SeatStore>, clock: Arc<dyn Clock>) -> Self {
        Self::build(store, clock, Duration::ZERO, None)
    }

    fn build(
        store: Arc<SeatStore>,
        clock: Arc<dyn Clock>,
        grace: Duration,
        runtime: Option<Handle>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                grace,
                runtime,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    /// Whether callbacks are actually spawned.
    pub fn is_active(&self) -> bool {
        self.inner.runtime.is_some() && !self.inner.tasks().closed
    }

    /// Schedule reclamation of the lock described by `ticket`.
    ///
    /// Replaces the seat's pending callback when `ticket` is newer. Returns
    /// `false` if nothing was scheduled: no runtime, shut down, or a newer
    /// lock already has its callback.
    pub fn schedule(&self, ticket: LockTicket) -> bool {
        let Some(runtime) = &self.inner.runtime else {
            return false;
        };

        let mut tasks = self.inner.tasks();
        if tasks.closed {
            return false;
        }
        if let Some(existing) = tasks.pending.get(&ticket.seat) {
            if existing.generation >= ticket.generation {
                trace!(seat = %ticket.seat, generation = ticket.generation, "stale expiry schedule ignored");
                return false;
            }
            existing.handle.abort();
        }

        let until_deadline = (ticket.deadline - self.inner.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let delay = until_deadline.saturating_add(self.inner.grace);

        let seat = ticket.seat;
        let generation = ticket.generation;
        let inner = Arc::clone(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire(&ticket);
        });

        tasks.pending.insert(seat, Pending { generation, handle });
        trace!(seat = %seat, generation, delay_ms = delay.as_millis() as u64, "expiry scheduled");
        true
    }

    /// Cancel the seat's pending callback if it belongs to `generation` or an
    /// older lock.
    pub fn cancel(&self, seat: SeatId, generation: u64) -> bool {
        let mut tasks = self.inner.tasks();
        let matches = tasks
            .pending
            .get(&seat)
            .is_some_and(|pending| pending.generation <= generation);
        if !matches {
            return false;
        }
        if let Some(pending) = tasks.pending.remove(&seat) {
            pending.handle.abort();
            trace!(seat = %seat, generation = pending.generation, "expiry cancelled");
        }
        true
    }

    /// Number of callbacks scheduled and not yet finished or cancelled.
    pub fn pending(&self) -> usize {
        self.inner.tasks().pending.len()
    }

    /// Abort every pending callback and refuse new ones.
    pub fn shutdown(&self) {
        let mut tasks = self.inner.tasks();
        if tasks.closed {
            return;
        }
        tasks.closed = true;
        let aborted = tasks.pending.len();
        for (_, pending) in tasks.pending.drain() {
            pending.handle.abort();
        }
        debug!(aborted, "expiry scheduler shut down");
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, ticket: &LockTicket) {
        let outcome = self.store.apply_transition(ticket.seat, |record| {
            Ok(record.reclaim_for_ticket(ticket, self.clock.now()))
        });

        match outcome {
            Ok(Some(reclaimed)) => debug!(
                seat = %reclaimed.seat,
                owner = %reclaimed.owner,
                generation = reclaimed.generation,
                "reclaimed expired lock"
            ),
            Ok(None) => trace!(
                seat = %ticket.seat,
                generation = ticket.generation,
                "lock already settled; nothing to reclaim"
            ),
            Err(err) => warn!(seat = %ticket.seat, error = %err, "scheduled reclamation failed"),
        }

        let mut tasks = self.tasks();
        let current = tasks
            .pending
            .get(&ticket.seat)
            .is_some_and(|pending| pending.generation == ticket.generation);
        if current {
            tasks.pending.remove(&ticket.seat);
        }
    }
}

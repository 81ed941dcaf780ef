//! Periodic full-table reclamation.

use crate::clock::Clock;
use crate::store::SeatStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Background task that reclaims every expired lock once per interval.
///
/// The task stops when [`Sweeper::shutdown`] is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct Sweeper {
    interval: Duration,
    handle: JoinHandle<()>,
}

impl Sweeper {
    /// Start sweeping on `runtime`. The first sweep runs one `interval` after
    /// start.
    pub fn spawn(
        store: Arc<SeatStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        runtime: &Handle,
    ) -> Self {
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                for reclaimed in store.reclaim_expired(clock.as_ref()) {
                    debug!(
                        seat = %reclaimed.seat,
                        owner = %reclaimed.owner,
                        "sweeper reclaimed expired lock"
                    );
                }
            }
        });

        info!(interval_ms = interval.as_millis() as u64, "expiry sweeper started");
        Self { interval, handle }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

//! Reclamation of timed-out locks.
//!
//! Three mechanisms cooperate:
//!
//! - **Lazy**: every operation on a seat reclaims an expired lock before it
//!   evaluates its own guard (see [`SeatRecord`](crate::core::SeatRecord)).
//!   This alone keeps every result correct.
//! - **Scheduled**: [`ExpiryScheduler`] fires one callback per lock shortly
//!   after its deadline, so untouched seats stop showing as `Locked` in raw
//!   store reads.
//! - **Sweep**: [`Sweeper`] optionally scans the whole table on an interval.

mod scheduler;
mod sweeper;

pub use scheduler::ExpiryScheduler;
pub use sweeper::Sweeper;

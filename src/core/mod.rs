//! Seat model and transition logic.
//!
//! This module contains the pure core of the reservation system:
//! - Validated seat and owner identifiers
//! - The `SeatStatus` enum and its legal moves
//! - `SeatRecord`, the per-seat state machine
//! - Bounded transition history
//!
//! Nothing here locks, sleeps, or reads a clock; time is always passed in.

mod history;
mod ids;
mod record;
mod seat;
mod status;

pub use history::{ReclaimSource, SeatHistory, SeatTransition, TransitionCause};
pub use ids::{OwnerId, SeatId, MAX_OWNER_LEN};
pub use record::{LockGranted, LockTicket, Reclaimed, SeatRecord, SeatState};
pub use seat::Seat;
pub use status::SeatStatus;

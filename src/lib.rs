//! Seatlock: a time-bounded seat reservation core
//!
//! Seatlock manages a fixed set of seats. A caller locks a seat for a short
//! time, then either confirms it into a permanent booking or releases it.
//! Locks that are neither confirmed nor released expire and the seat returns
//! to the pool.
//!
//! # Core Concepts
//!
//! - **Seat**: Snapshot of one seat's status, owner, and lock deadline
//! - **SeatRecord**: The per-seat state machine that enforces the legal moves
//! - **SeatStore**: Fixed table of records, mutated one seat at a time
//! - **Expiry**: Lazy reclamation on every access, plus optional scheduled
//!   and periodic reclamation on a tokio runtime
//! - **Clock**: Injected time source, so expiry is testable without waiting
//!
//! # Example
//!
//! ```rust
//! use seatlock::clock::ManualClock;
//! use seatlock::config::ReservationConfig;
//! use seatlock::core::{OwnerId, SeatId, SeatStatus};
//! use seatlock::ReservationService;
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::at_epoch());
//! let service = ReservationService::new(ReservationConfig::default(), clock).unwrap();
//!
//! let owner = OwnerId::new("alice").unwrap();
//! service.lock_seat(SeatId::new(1), &owner).unwrap();
//! let booked = service.confirm_seat(SeatId::new(1), &owner).unwrap();
//!
//! assert_eq!(booked.status, SeatStatus::Booked);
//! assert_eq!(service.availability().booked, 1);
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod expiry;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ReservationConfig};
pub use core::{OwnerId, Seat, SeatId, SeatStatus};
pub use error::{ErrorKind, InvariantViolation, ReservationError};
pub use service::{Released, ReservationService};
pub use store::AvailabilitySummary;

//! Per-seat transition history.
//!
//! Each seat keeps a bounded, ordered log of the transitions committed to it,
//! which hosts can expose for auditing ("who held seat 4 before it was
//! booked?"). The oldest entries are dropped once the limit is reached.

use super::ids::OwnerId;
use super::status::SeatStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Which mechanism noticed that a lock had expired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReclaimSource {
    /// An operation on the seat found the deadline already passed.
    Lazy,
    /// The per-lock expiry callback fired.
    Scheduled,
    /// The periodic sweeper scanned the table.
    Sweep,
}

/// Why a transition happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    Locked,
    Refreshed,
    Confirmed,
    Released,
    Expired(ReclaimSource),
}

/// Record of a single committed seat transition.
///
/// `owner` is the owner involved in the move: the new holder for a lock, the
/// previous holder for a release or expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatTransition {
    /// The status being transitioned from
    pub from: SeatStatus,
    /// The status being transitioned to
    pub to: SeatStatus,
    pub owner: OwnerId,
    /// When the transition occurred
    pub at: DateTime<Utc>,
    pub cause: TransitionCause,
}

/// Ordered, bounded history of seat transitions.
///
/// # Example
///
/// ```rust
/// use seatlock::core::{OwnerId, SeatHistory, SeatStatus, SeatTransition, TransitionCause};
/// use chrono::Utc;
///
/// let mut history = SeatHistory::with_limit(2);
/// let owner = OwnerId::new("alice").unwrap();
///
/// for (from, to, cause) in [
///     (SeatStatus::Available, SeatStatus::Locked, TransitionCause::Locked),
///     (SeatStatus::Locked, SeatStatus::Available, TransitionCause::Released),
///     (SeatStatus::Available, SeatStatus::Locked, TransitionCause::Locked),
/// ] {
///     history.record(SeatTransition { from, to, owner: owner.clone(), at: Utc::now(), cause });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.dropped(), 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeatHistory {
    transitions: VecDeque<SeatTransition>,
    limit: usize,
    dropped: u64,
}

impl SeatHistory {
    /// Create an empty history keeping at most `limit` transitions.
    ///
    /// A limit of zero disables recording.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(limit.min(64)),
            limit,
            dropped: 0,
        }
    }

    /// Append a transition, evicting the oldest one when full.
    pub fn record(&mut self, transition: SeatTransition) {
        if self.limit == 0 {
            self.dropped += 1;
            return;
        }
        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
            self.dropped += 1;
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of statuses traversed by the retained transitions.
    ///
    /// Returns the `from` status of the oldest retained transition, then the
    /// `to` status of each transition.
    pub fn get_path(&self) -> Vec<SeatStatus> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &SeatTransition> + '_ {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&SeatTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Number of transitions evicted or never retained.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Total transitions ever recorded, retained or not.
    pub fn recorded(&self) -> u64 {
        self.transitions.len() as u64 + self.dropped
    }

    /// Forget the retained entries recorded after `mark`, a value previously
    /// returned by [`SeatHistory::recorded`]. Entries evicted in between stay
    /// counted as dropped.
    pub(crate) fn discard_since(&mut self, mark: u64) {
        let newer = self.recorded().saturating_sub(mark);
        for _ in 0..newer {
            if self.transitions.pop_back().is_none() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: SeatStatus, to: SeatStatus, cause: TransitionCause) -> SeatTransition {
        SeatTransition {
            from,
            to,
            owner: OwnerId::new("alice").unwrap(),
            at: Utc::now(),
            cause,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = SeatHistory::with_limit(4);
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn get_path_returns_status_sequence() {
        let mut history = SeatHistory::with_limit(4);
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));
        history.record(transition(
            SeatStatus::Locked,
            SeatStatus::Booked,
            TransitionCause::Confirmed,
        ));

        assert_eq!(
            history.get_path(),
            vec![SeatStatus::Available, SeatStatus::Locked, SeatStatus::Booked]
        );
        assert_eq!(history.last().unwrap().cause, TransitionCause::Confirmed);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history = SeatHistory::with_limit(2);
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));
        history.record(transition(
            SeatStatus::Locked,
            SeatStatus::Available,
            TransitionCause::Expired(ReclaimSource::Lazy),
        ));
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));

        assert_eq!(history.len(), 2);
        assert_eq!(history.dropped(), 1);
        assert_eq!(
            history.transitions().next().unwrap().cause,
            TransitionCause::Expired(ReclaimSource::Lazy)
        );
    }

    #[test]
    fn discard_since_drops_newer_entries() {
        let mut history = SeatHistory::with_limit(2);
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));
        let mark = history.recorded();

        history.record(transition(
            SeatStatus::Locked,
            SeatStatus::Available,
            TransitionCause::Released,
        ));
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));
        history.discard_since(mark);

        // the first entry was evicted on the way and is not brought back
        assert!(history.is_empty());
        assert_eq!(history.dropped(), 1);
    }

    #[test]
    fn zero_limit_disables_recording() {
        let mut history = SeatHistory::with_limit(0);
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));
        assert!(history.is_empty());
        assert_eq!(history.dropped(), 1);
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = SeatHistory::with_limit(3);
        history.record(transition(
            SeatStatus::Available,
            SeatStatus::Locked,
            TransitionCause::Locked,
        ));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: SeatHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.len(), 1);
        assert_eq!(deserialized.last(), history.last());
    }
}

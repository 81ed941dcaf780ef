//! End-to-end scenarios against the public service API.

use seatlock::core::{ReclaimSource, TransitionCause};
use seatlock::{
    Clock, ErrorKind, ManualClock, OwnerId, ReservationConfig, ReservationError, ReservationService,
    SeatId, SeatStatus, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;

fn owner(name: &str) -> OwnerId {
    OwnerId::new(name).unwrap()
}

fn box_office(seats: u32) -> (Arc<ReservationService>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_epoch());
    let config = ReservationConfig::builder()
        .seat_count(seats)
        .lock_ttl(Duration::from_secs(60))
        .build()
        .unwrap();
    let service = ReservationService::new(config, clock.clone()).unwrap();
    (Arc::new(service), clock)
}

#[test]
fn confirm_after_ttl_reports_expiry() {
    let (service, clock) = box_office(5);
    let seat = SeatId::new(3);

    service.lock_seat(seat, &owner("A")).unwrap();
    clock.advance(Duration::from_secs(61));

    assert_eq!(
        service.confirm_seat(seat, &owner("A")),
        Err(ReservationError::LockExpired { seat })
    );
    assert_eq!(service.get_seat(seat).unwrap().status, SeatStatus::Available);
}

#[test]
fn lock_confirm_then_others_see_booked() {
    let (service, _) = box_office(5);
    let seat = SeatId::new(2);

    service.lock_seat(seat, &owner("A")).unwrap();
    let booked = service.confirm_seat(seat, &owner("A")).unwrap();
    assert_eq!(booked.status, SeatStatus::Booked);
    assert_eq!(booked.owner_id, Some(owner("A")));

    assert_eq!(
        service.lock_seat(seat, &owner("B")).unwrap_err().kind(),
        ErrorKind::AlreadyBooked
    );
}

#[test]
fn confirm_without_lock_is_not_locked() {
    let (service, _) = box_office(5);
    for raw in 1..=5 {
        assert_eq!(
            service
                .confirm_seat(SeatId::new(raw), &owner("A"))
                .unwrap_err()
                .kind(),
            ErrorKind::NotLocked
        );
    }
}

#[test]
fn release_of_available_seat_changes_nothing() {
    let (service, _) = box_office(5);
    let seat = SeatId::new(1);
    let before = service.get_seat(seat).unwrap();

    assert_eq!(
        service.release_seat(seat, &owner("A")),
        Err(ReservationError::NotLocked { seat })
    );
    assert_eq!(service.get_seat(seat).unwrap(), before);
    assert!(service.seat_history(seat).unwrap().is_empty());
}

#[test]
fn reclaimed_seat_carries_no_trace_of_previous_owner() {
    let (service, clock) = box_office(5);
    let seat = SeatId::new(5);

    service
        .lock_seat_for(seat, &owner("A"), Duration::from_secs(1))
        .unwrap();
    clock.advance(Duration::from_secs(2));

    let locked = service.lock_seat(seat, &owner("B")).unwrap();
    assert_eq!(locked.status, SeatStatus::Locked);
    assert_eq!(locked.owner_id, Some(owner("B")));
    assert_eq!(
        locked.lock_deadline,
        Some(clock.now() + chrono::Duration::seconds(60))
    );
}

#[test]
fn listing_never_shows_expired_locks() {
    let (service, clock) = box_office(5);
    for (raw, ttl) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
        service
            .lock_seat_for(SeatId::new(raw), &owner("A"), Duration::from_secs(ttl))
            .unwrap();
    }

    clock.advance(Duration::from_secs(25));
    let statuses: Vec<_> = service
        .list_seats()
        .into_iter()
        .map(|seat| seat.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            SeatStatus::Available,
            SeatStatus::Available,
            SeatStatus::Locked,
            SeatStatus::Locked,
            SeatStatus::Available,
        ]
    );
}

#[test]
fn owner_ids_are_validated() {
    assert!(OwnerId::new("").is_err());
    assert!(OwnerId::new("   ").is_err());
    assert!("alice".parse::<OwnerId>().is_ok());
    assert_eq!(
        "seven".parse::<SeatId>().unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

#[test]
fn concurrent_lockers_across_seats() {
    let (service, _) = box_office(4);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..64u32)
            .map(|n| {
                let service = Arc::clone(&service);
                scope.spawn(move || {
                    let seat = SeatId::new(n % 4 + 1);
                    let result = service.lock_seat(seat, &owner(&format!("caller-{n}")));
                    (seat, result)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for raw in 1..=4 {
        let seat = SeatId::new(raw);
        let wins = outcomes
            .iter()
            .filter(|(id, result)| *id == seat && result.is_ok())
            .count();
        assert_eq!(wins, 1, "seat {seat} should have exactly one winner");
    }
    assert!(outcomes
        .iter()
        .filter_map(|(_, result)| result.as_ref().err())
        .all(|err| err.kind() == ErrorKind::AlreadyLockedByOther));
}

#[test]
fn racing_confirm_and_late_lock() {
    let (service, clock) = box_office(1);
    let seat = SeatId::new(1);
    service.lock_seat(seat, &owner("A")).unwrap();
    clock.advance(Duration::from_secs(61));

    let (confirm, lock) = std::thread::scope(|scope| {
        let confirm = scope.spawn(|| service.confirm_seat(seat, &owner("A")));
        let lock = scope.spawn(|| service.lock_seat(seat, &owner("B")));
        (confirm.join().unwrap(), lock.join().unwrap())
    });

    // whichever ran first, A's lapsed lock cannot turn into a booking
    assert!(confirm.is_err());
    assert!(lock.is_ok());
    let current = service.get_seat(seat).unwrap();
    assert_eq!(current.status, SeatStatus::Locked);
    assert_eq!(current.owner_id, Some(owner("B")));
}

#[tokio::test(start_paused = true)]
async fn scheduled_expiry_frees_untouched_seats() {
    let (service, clock) = box_office(3);
    service.lock_seat(SeatId::new(1), &owner("A")).unwrap();
    service.lock_seat(SeatId::new(2), &owner("B")).unwrap();
    service.confirm_seat(SeatId::new(2), &owner("B")).unwrap();
    assert_eq!(service.pending_expiries(), 1);

    clock.advance(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(service.pending_expiries(), 0);
    let history = service.seat_history(SeatId::new(1)).unwrap();
    assert_eq!(
        history.last().map(|transition| transition.cause),
        Some(TransitionCause::Expired(ReclaimSource::Scheduled))
    );
    assert_eq!(service.availability().booked, 1);
}

#[tokio::test(start_paused = true)]
async fn sweeper_reclaims_when_active_expiry_is_off() {
    let clock = Arc::new(ManualClock::at_epoch());
    let config = ReservationConfig::builder()
        .seat_count(2)
        .active_expiry(false)
        .sweep_interval(Duration::from_secs(5))
        .build()
        .unwrap();
    let service = ReservationService::new(config, clock.clone()).unwrap();

    service.lock_seat(SeatId::new(1), &owner("A")).unwrap();
    assert_eq!(service.pending_expiries(), 0);

    clock.advance(Duration::from_secs(61));
    tokio::time::sleep(Duration::from_secs(6)).await;

    let history = service.seat_history(SeatId::new(1)).unwrap();
    assert_eq!(
        history.last().map(|transition| transition.cause),
        Some(TransitionCause::Expired(ReclaimSource::Sweep))
    );
    service.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_on_system_clock() {
    let config = ReservationConfig::builder()
        .seat_count(8)
        .lock_ttl(Duration::from_secs(30))
        .build()
        .unwrap();
    let service = Arc::new(ReservationService::new(config, Arc::new(SystemClock::new())).unwrap());

    let mut tasks = Vec::new();
    for n in 0..40u32 {
        let service = Arc::clone(&service);
        tasks.push(tokio::spawn(async move {
            let seat = SeatId::new(n % 8 + 1);
            let who = owner(&format!("task-{n}"));
            service
                .lock_seat(seat, &who)
                .and_then(|_| service.confirm_seat(seat, &who))
        }));
    }

    let mut booked = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            booked += 1;
        }
    }

    assert_eq!(booked, 8);
    let summary = service.availability();
    assert_eq!(summary.booked, 8);
    assert_eq!(summary.available, 0);
    service.shutdown();
}

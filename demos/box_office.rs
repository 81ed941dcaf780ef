//! Box Office
//!
//! This example simulates a ticket sale with many concurrent buyers.
//!
//! Key concepts:
//! - Racing buyers: one lock wins per seat, the rest are told why they lost
//! - Two-phase purchase: lock first, then confirm or release
//! - Abandoned checkouts: short locks that expire and return seats to the pool
//!
//! Configuration is read from `SEATLOCK_*` environment variables.
//!
//! Run with: cargo run --example box_office
//! More detail: RUST_LOG=seatlock=debug cargo run --example box_office

use seatlock::{
    ErrorKind, OwnerId, ReservationConfig, ReservationService, SeatId, SeatStatus, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy)]
enum Buyer {
    Purchases,
    ChangesMind,
    Abandons,
}

impl Buyer {
    fn for_index(n: u32) -> Self {
        match n % 3 {
            0 => Self::Purchases,
            1 => Self::ChangesMind,
            _ => Self::Abandons,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,seatlock=info,box_office=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ReservationConfig::from_env()?;
    let seat_count = config.seat_count;
    let service = Arc::new(ReservationService::new(config, Arc::new(SystemClock::new()))?);

    println!("=== Box Office ===\n");
    println!("Seats on sale: {seat_count}\n");

    let mut buyers = Vec::new();
    for n in 0..seat_count * 3 {
        let service = Arc::clone(&service);
        buyers.push(tokio::spawn(async move {
            let who = OwnerId::new(format!("buyer-{n}"))?;
            let seat = SeatId::new(n % seat_count + 1);
            let behaviour = Buyer::for_index(n / seat_count);

            let ttl = match behaviour {
                Buyer::Abandons => Duration::from_millis(200),
                _ => service.config().lock_ttl,
            };
            if let Err(err) = service.lock_seat_for(seat, &who, ttl) {
                println!("  {who}: seat {seat} unavailable ({err})");
                return Ok::<_, seatlock::ReservationError>(());
            }

            tokio::time::sleep(Duration::from_millis(20)).await;
            match behaviour {
                Buyer::Purchases => {
                    service.confirm_seat(seat, &who)?;
                    println!("  {who}: booked seat {seat}");
                }
                Buyer::ChangesMind => {
                    service.release_seat(seat, &who)?;
                    println!("  {who}: released seat {seat}");
                }
                Buyer::Abandons => println!("  {who}: walked away from seat {seat}"),
            }
            Ok(())
        }));
    }
    for buyer in buyers {
        buyer.await??;
    }

    println!("\nAfter the first wave: {:?}", service.availability());

    // let abandoned locks run out
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\nSecond wave for anything left:");
    for seat in service.list_seats() {
        if seat.status != SeatStatus::Available {
            continue;
        }
        let who = OwnerId::new(format!("latecomer-{}", seat.id))?;
        match service.lock_seat(seat.id, &who) {
            Ok(_) => {
                service.confirm_seat(seat.id, &who)?;
                println!("  {who}: booked seat {}", seat.id);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyLockedByOther => {
                println!("  {who}: lost the race for seat {}", seat.id);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let summary = service.availability();
    println!("\nFinal: {summary:?}");
    println!("Pending expiries: {}", service.pending_expiries());

    service.shutdown();
    Ok(())
}

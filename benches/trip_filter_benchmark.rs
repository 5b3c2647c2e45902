use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use travel_planner::models::trip::derive_status;
use travel_planner::models::{Difficulty, Trip, TripDetails, TripFilter, TripStatus};
use uuid::Uuid;

const DESTINATIONS: [&str; 5] = ["Altai", "Baikal", "Karelia", "Elbrus", "Kamchatka"];
const DIFFICULTIES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

/// A spread of trips over two years, some past, some ongoing, most upcoming.
fn fixture(count: usize) -> Vec<Trip> {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let organizer = Uuid::new_v4();

    (0..count)
        .map(|i| {
            let start = base + Duration::days((i % 730) as i64);
            let details = TripDetails {
                title: format!("Trip {}", i),
                destination: DESTINATIONS[i % DESTINATIONS.len()].to_string(),
                description: "Benchmark fixture".to_string(),
                start_date: start,
                end_date: start + Duration::days(1 + (i % 21) as i64),
                price: (i % 200) as f64 * 1000.0,
                max_participants: 1 + (i % 50) as u32,
                difficulty: DIFFICULTIES[i % DIFFICULTIES.len()],
            };
            Trip::new(organizer, details, base)
        })
        .collect()
}

fn benchmark_trip_filter(c: &mut Criterion) {
    let trips = fixture(10_000);
    let now = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();

    let default_filter = TripFilter::default();
    let narrow_filter = TripFilter {
        destination: Some("kar".to_string()),
        min_price: Some(20_000.0),
        max_price: Some(150_000.0),
        difficulty: Some(vec![Difficulty::Medium, Difficulty::Hard]),
        status: vec![TripStatus::Planning],
        min_duration: Some(5),
        max_duration: Some(14),
        ..TripFilter::default()
    };

    let mut group = c.benchmark_group("trip_listing");

    group.bench_function("derive_status", |b| {
        b.iter(|| {
            trips
                .iter()
                .filter(|t| derive_status(black_box(now), t) == TripStatus::Active)
                .count()
        })
    });

    group.bench_function("default_filter", |b| {
        b.iter(|| {
            trips
                .iter()
                .filter(|t| black_box(&default_filter).matches(t))
                .count()
        })
    });

    group.bench_function("narrow_filter", |b| {
        b.iter(|| {
            trips
                .iter()
                .filter(|t| black_box(&narrow_filter).matches(t))
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_trip_filter);
criterion_main!(benches);

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running, with
//! `FIRESTORE_EMULATOR_HOST` pointing at it.
//!
//! Every test uses fresh random IDs and emails, so runs do not interfere.

use chrono::{Duration, Utc};
use std::sync::Arc;
use travel_planner::db::{Decision, DecisionOutcome, Store, TripUpdateOutcome};
use travel_planner::error::AppError;
use travel_planner::models::{
    Application, ApplicationStatus, Difficulty, RefreshTokenRecord, Trip, TripDetails, TripStatus,
    User,
};
use uuid::Uuid;

mod common;
use common::test_db;

/// Helper to create a basic test user with a unique email
fn test_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", Uuid::new_v4()),
        password_hash: "$2b$04$not-a-real-hash".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
        skills: vec!["driver".to_string()],
        main_skills: vec!["driver".to_string()],
        allergies: Vec::new(),
        medical_conditions: Vec::new(),
        dietary_restrictions: Vec::new(),
        about_me: None,
        trips_as_organizer: 0,
        trips_as_participant: 0,
        organized_trips: Vec::new(),
        joined_trips: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

fn test_details(max_participants: u32) -> TripDetails {
    let start = Utc::now() + Duration::days(30);
    TripDetails {
        title: "Emulator trek".to_string(),
        destination: "Kamchatka".to_string(),
        description: "Volcanoes".to_string(),
        start_date: start,
        end_date: start + Duration::days(7),
        price: 120000.0,
        max_participants,
        difficulty: Difficulty::Hard,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_round_trip_and_email_claim() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user();

    db.create_user(&user).await.unwrap();

    let fetched = db.get_user(user.id).await.unwrap().expect("user exists");
    assert_eq!(fetched.email, user.email);
    let by_email = db
        .find_user_by_email(&user.email)
        .await
        .unwrap()
        .expect("email resolves");
    assert_eq!(by_email.id, user.id);

    // Same email, different user
    let mut twin = test_user();
    twin.email = user.email.clone();
    let err = db.create_user(&twin).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateEmail));
    assert!(db.get_user(twin.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_profile_update_keeps_counters() {
    require_emulator!();

    let db = test_db().await;
    let mut user = test_user();
    db.create_user(&user).await.unwrap();
    let trip = Trip::new(user.id, test_details(3), Utc::now());
    db.create_trip(&trip).await.unwrap();

    // Stale copy: counters still zero
    user.about_me = Some("Updated".to_string());
    db.update_user_profile(&user).await.unwrap();

    let fetched = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.about_me.as_deref(), Some("Updated"));
    assert_eq!(fetched.trips_as_organizer, 1);
    assert_eq!(fetched.organized_trips, vec![trip.id]);
}

// ═══════════════════════════════════════════════════════════════════════════
// TRIP AND APPLICATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_accept_respects_capacity() {
    require_emulator!();

    let db = test_db().await;
    let organizer = test_user();
    let first = test_user();
    let second = test_user();
    for user in [&organizer, &first, &second] {
        db.create_user(user).await.unwrap();
    }
    let trip = Trip::new(organizer.id, test_details(1), Utc::now());
    db.create_trip(&trip).await.unwrap();

    let a = Application::new(first.id, trip.id, String::new(), Utc::now());
    let b = Application::new(second.id, trip.id, String::new(), Utc::now());
    db.create_application(&a).await.unwrap();
    db.create_application(&b).await.unwrap();

    let err = db.create_application(&a).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateApplication));

    let outcome = db
        .decide_application(a.id, Decision::Accept, Utc::now())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DecisionOutcome::Done(ref app) if app.status == ApplicationStatus::Accepted
    ));

    let outcome = db
        .decide_application(b.id, Decision::Accept, Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, DecisionOutcome::CapacityExceeded));

    let outcome = db
        .decide_application(a.id, Decision::Reject, Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, DecisionOutcome::NotPending));

    let stored = db.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.participants, vec![first.id]);
    let joined = db.get_user(first.id).await.unwrap().unwrap();
    assert_eq!(joined.trips_as_participant, 1);
    assert_eq!(joined.joined_trips, vec![trip.id]);

    let outcome = db
        .update_trip_details(trip.id, &test_details(0), Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, TripUpdateOutcome::BelowParticipants(1)));
}

#[tokio::test]
async fn test_concurrent_accepts_never_overfill() {
    require_emulator!();

    let db = Arc::new(test_db().await);
    let organizer = test_user();
    db.create_user(&organizer).await.unwrap();
    let trip = Trip::new(organizer.id, test_details(2), Utc::now());
    db.create_trip(&trip).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..6 {
        let user = test_user();
        db.create_user(&user).await.unwrap();
        let app = Application::new(user.id, trip.id, String::new(), Utc::now());
        db.create_application(&app).await.unwrap();
        ids.push(app.id);
    }

    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let db = db.clone();
            tokio::spawn(async move {
                db.decide_application(id, Decision::Accept, Utc::now())
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        // Contention may exhaust retries; that surfaces as an error, never an overfill.
        if let Ok(Ok(DecisionOutcome::Done(_))) = handle.await {
            accepted += 1;
        }
    }

    let stored = db.get_trip(trip.id).await.unwrap().unwrap();
    assert!(stored.participants.len() <= 2);
    assert_eq!(stored.participants.len(), accepted);
}

#[tokio::test]
async fn test_withdraw_and_delete_cascade() {
    require_emulator!();

    let db = test_db().await;
    let organizer = test_user();
    let user = test_user();
    db.create_user(&organizer).await.unwrap();
    db.create_user(&user).await.unwrap();
    let trip = Trip::new(organizer.id, test_details(4), Utc::now());
    db.create_trip(&trip).await.unwrap();

    let app = Application::new(user.id, trip.id, "hi".to_string(), Utc::now());
    db.create_application(&app).await.unwrap();
    assert!(matches!(
        db.withdraw_application(app.id).await.unwrap(),
        DecisionOutcome::Done(_)
    ));
    assert!(db.get_application(app.id).await.unwrap().is_none());

    db.create_application(&app).await.unwrap();
    db.delete_trip(&trip).await.unwrap();

    assert!(db.get_trip(trip.id).await.unwrap().is_none());
    assert!(db.get_application(app.id).await.unwrap().is_none());
    let organizer = db.get_user(organizer.id).await.unwrap().unwrap();
    assert_eq!(organizer.trips_as_organizer, 0);
    assert!(organizer.organized_trips.is_empty());
}

#[tokio::test]
async fn test_status_write_updates_only_status() {
    require_emulator!();

    let db = test_db().await;
    let organizer = test_user();
    db.create_user(&organizer).await.unwrap();
    let trip = Trip::new(organizer.id, test_details(4), Utc::now());
    db.create_trip(&trip).await.unwrap();

    db.set_trip_status(trip.id, TripStatus::Active).await.unwrap();

    let stored = db.get_trip(trip.id).await.unwrap().expect("trip exists");
    assert_eq!(stored.status, TripStatus::Active);
    assert_eq!(stored.title, trip.title);
    assert_eq!(stored.max_participants, trip.max_participants);
}

#[tokio::test]
async fn test_status_write_does_not_recreate_deleted_trip() {
    require_emulator!();

    let db = test_db().await;
    let organizer = test_user();
    db.create_user(&organizer).await.unwrap();
    let trip = Trip::new(organizer.id, test_details(4), Utc::now());
    db.create_trip(&trip).await.unwrap();
    db.delete_trip(&trip).await.unwrap();

    db.set_trip_status(trip.id, TripStatus::Active).await.unwrap();

    assert!(db.get_trip(trip.id).await.unwrap().is_none());
    let remaining = db.list_trips().await.unwrap();
    assert!(remaining.iter().all(|t| t.id != trip.id));
}

// ═══════════════════════════════════════════════════════════════════════════
// REFRESH TOKEN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_refresh_token_records() {
    require_emulator!();

    let db = test_db().await;
    let digest = format!("{:064x}", Uuid::new_v4().as_u128());
    let record = RefreshTokenRecord {
        user_id: Uuid::new_v4(),
        expires_at: Utc::now() + Duration::days(7),
        created_at: Utc::now(),
    };

    db.put_refresh_token(&digest, &record).await.unwrap();
    let fetched = db.get_refresh_token(&digest).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, record.user_id);

    db.delete_refresh_token(&digest).await.unwrap();
    assert!(db.get_refresh_token(&digest).await.unwrap().is_none());
    // Idempotent
    db.delete_refresh_token(&digest).await.unwrap();
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage backend for local development and tests.
//!
//! Multi-record operations on a trip (decisions, edits, deletion, new
//! applications) are serialized by a per-trip async lock, so a capacity check
//! and the participant append it guards can never interleave with another
//! decision on the same trip. DashMap references are never held across an
//! `.await`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Decision, DecisionOutcome, Store, TripUpdateOutcome};
use crate::error::AppError;
use crate::models::{
    Application, ApplicationStatus, RefreshTokenRecord, Trip, TripDetails, TripStatus, User,
};

type TripLocks = DashMap<Uuid, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<Uuid, User>,
    /// Lowercased email -> user ID
    emails: DashMap<String, Uuid>,
    trips: DashMap<Uuid, Trip>,
    applications: DashMap<Uuid, Application>,
    refresh_tokens: DashMap<String, RefreshTokenRecord>,
    trip_locks: TripLocks,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn trip_lock(&self, trip_id: Uuid) -> Arc<Mutex<()>> {
        self.trip_locks
            .entry(trip_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `op` holding the lock for `trip_id`. Afterwards the lock entry is
    /// dropped if the trip no longer exists; trip IDs are never reused.
    async fn with_trip_lock<T>(&self, trip_id: Uuid, op: impl FnOnce() -> T + Send) -> T {
        let lock = self.trip_lock(trip_id);
        let guard = lock.lock().await;
        let result = op();
        drop(guard);
        if !self.trips.contains_key(&trip_id) {
            self.trip_locks.remove(&trip_id);
        }
        result
    }
}

#[async_trait]
impl Store for MemoryDb {
    // ─── Users ──────────────────────────────────────────────────

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateEmail),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(())
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let Some(id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        self.get_user(id).await
    }

    async fn update_user_profile(&self, user: &User) -> Result<(), AppError> {
        let mut stored = self
            .users
            .get_mut(&user.id)
            .ok_or(AppError::NotFound("User"))?;
        stored.password_hash = user.password_hash.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.phone = user.phone.clone();
        stored.skills = user.skills.clone();
        stored.main_skills = user.main_skills.clone();
        stored.allergies = user.allergies.clone();
        stored.medical_conditions = user.medical_conditions.clone();
        stored.dietary_restrictions = user.dietary_restrictions.clone();
        stored.about_me = user.about_me.clone();
        stored.updated_at = user.updated_at;
        Ok(())
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    // ─── Trips ──────────────────────────────────────────────────

    async fn create_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let mut organizer = self
            .users
            .get_mut(&trip.organizer_id)
            .ok_or(AppError::NotFound("User"))?;
        self.trips.insert(trip.id, trip.clone());
        organizer.add_organized_trip(trip.id);
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        Ok(self.trips.get(&id).map(|t| t.clone()))
    }

    async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        Ok(self.trips.iter().map(|t| t.value().clone()).collect())
    }

    async fn list_trips_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Trip>, AppError> {
        Ok(self
            .trips
            .iter()
            .filter(|t| t.organizer_id == organizer_id)
            .map(|t| t.value().clone())
            .collect())
    }

    async fn update_trip_details(
        &self,
        id: Uuid,
        details: &TripDetails,
        now: DateTime<Utc>,
    ) -> Result<TripUpdateOutcome, AppError> {
        self.with_trip_lock(id, || {
            let Some(mut trip) = self.trips.get_mut(&id) else {
                return Ok(TripUpdateOutcome::Missing);
            };
            if details.max_participants < trip.current_participants() {
                return Ok(TripUpdateOutcome::BelowParticipants(
                    trip.current_participants(),
                ));
            }
            trip.apply_details(details.clone(), now);
            Ok(TripUpdateOutcome::Updated(trip.clone()))
        })
        .await
    }

    async fn set_trip_status(&self, id: Uuid, status: TripStatus) -> Result<(), AppError> {
        if let Some(mut trip) = self.trips.get_mut(&id) {
            // A cancellation is never overwritten by a derived status.
            if trip.status != TripStatus::Cancelled {
                trip.status = status;
            }
        }
        Ok(())
    }

    async fn delete_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.with_trip_lock(trip.id, || {
            if self.trips.remove(&trip.id).is_none() {
                return;
            }
            self.applications.retain(|_, app| app.trip_id != trip.id);
            if let Some(mut organizer) = self.users.get_mut(&trip.organizer_id) {
                organizer.remove_organized_trip(trip.id);
            }
        })
        .await;
        Ok(())
    }

    // ─── Applications ───────────────────────────────────────────

    async fn create_application(&self, application: &Application) -> Result<(), AppError> {
        self.with_trip_lock(application.trip_id, || {
            if !self.trips.contains_key(&application.trip_id) {
                return Err(AppError::NotFound("Trip"));
            }
            match self.applications.entry(application.id) {
                Entry::Occupied(_) => Err(AppError::DuplicateApplication),
                Entry::Vacant(slot) => {
                    slot.insert(application.clone());
                    Ok(())
                }
            }
        })
        .await
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        Ok(self.applications.get(&id).map(|a| a.clone()))
    }

    async fn list_applications_by_user(&self, user_id: Uuid) -> Result<Vec<Application>, AppError> {
        Ok(self
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.value().clone())
            .collect())
    }

    async fn list_applications_for_trips(
        &self,
        trip_ids: &[Uuid],
    ) -> Result<Vec<Application>, AppError> {
        Ok(self
            .applications
            .iter()
            .filter(|a| trip_ids.contains(&a.trip_id))
            .map(|a| a.value().clone())
            .collect())
    }

    async fn decide_application(
        &self,
        id: Uuid,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, AppError> {
        let Some(trip_id) = self.applications.get(&id).map(|a| a.trip_id) else {
            return Ok(DecisionOutcome::Missing);
        };
        self.with_trip_lock(trip_id, || {
            // Re-read under the lock; another decision may have landed first.
            let Some(mut application) = self.applications.get(&id).map(|a| a.clone()) else {
                return Ok(DecisionOutcome::Missing);
            };
            if !application.is_pending() {
                return Ok(DecisionOutcome::NotPending);
            }

            match decision {
                Decision::Reject => {
                    application.decide(ApplicationStatus::Rejected, now);
                }
                Decision::Accept => {
                    let Some(mut trip) = self.trips.get_mut(&trip_id) else {
                        return Ok(DecisionOutcome::Missing);
                    };
                    if !trip.has_capacity() {
                        return Ok(DecisionOutcome::CapacityExceeded);
                    }
                    if !trip.is_participant(application.user_id) {
                        trip.participants.push(application.user_id);
                    }
                    trip.updated_at = now;
                    drop(trip);

                    if let Some(mut applicant) = self.users.get_mut(&application.user_id) {
                        applicant.add_joined_trip(trip_id);
                    }
                    application.decide(ApplicationStatus::Accepted, now);
                }
            }

            self.applications.insert(id, application.clone());
            Ok(DecisionOutcome::Done(application))
        })
        .await
    }

    async fn withdraw_application(&self, id: Uuid) -> Result<DecisionOutcome, AppError> {
        let Some(trip_id) = self.applications.get(&id).map(|a| a.trip_id) else {
            return Ok(DecisionOutcome::Missing);
        };
        self.with_trip_lock(trip_id, || {
            match self.applications.remove_if(&id, |_, app| app.is_pending()) {
                Some((_, application)) => Ok(DecisionOutcome::Done(application)),
                None if self.applications.contains_key(&id) => Ok(DecisionOutcome::NotPending),
                None => Ok(DecisionOutcome::Missing),
            }
        })
        .await
    }

    // ─── Refresh Tokens ─────────────────────────────────────────

    async fn put_refresh_token(
        &self,
        digest: &str,
        record: &RefreshTokenRecord,
    ) -> Result<(), AppError> {
        self.refresh_tokens
            .insert(digest.to_string(), record.clone());
        Ok(())
    }

    async fn get_refresh_token(
        &self,
        digest: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(self.refresh_tokens.get(digest).map(|r| r.clone()))
    }

    async fn delete_refresh_token(&self, digest: &str) -> Result<(), AppError> {
        self.refresh_tokens.remove(digest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::NewUser;
    use crate::models::Difficulty;
    use chrono::Duration;

    fn user(email: &str) -> User {
        NewUser {
            email: email.to_string(),
            password: String::new(),
            first_name: "Ivan".to_string(),
            last_name: "Ivanov".to_string(),
            phone: None,
            skills: vec![],
            main_skills: vec![],
            allergies: vec![],
            medical_conditions: vec![],
            dietary_restrictions: vec![],
            about_me: None,
        }
        .into_user("hash".to_string(), Utc::now())
    }

    fn trip(organizer: Uuid, max_participants: u32) -> Trip {
        let now = Utc::now();
        Trip::new(
            organizer,
            TripDetails {
                title: "Kamchatka".to_string(),
                destination: "Kamchatka".to_string(),
                description: "Volcanoes".to_string(),
                start_date: now + Duration::days(30),
                end_date: now + Duration::days(40),
                price: 1000.0,
                max_participants,
                difficulty: Difficulty::Hard,
            },
            now,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = MemoryDb::new();
        db.create_user(&user("a@example.com")).await.unwrap();

        let err = db.create_user(&user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_create_and_delete_trip_updates_organizer() {
        let db = MemoryDb::new();
        let organizer = user("org@example.com");
        db.create_user(&organizer).await.unwrap();
        let trip = trip(organizer.id, 2);
        db.create_trip(&trip).await.unwrap();

        let stored = db.get_user(organizer.id).await.unwrap().unwrap();
        assert_eq!(stored.trips_as_organizer, 1);
        assert_eq!(stored.organized_trips, vec![trip.id]);

        let app = Application::new(Uuid::new_v4(), trip.id, String::new(), Utc::now());
        db.create_application(&app).await.unwrap();

        db.delete_trip(&trip).await.unwrap();
        let stored = db.get_user(organizer.id).await.unwrap().unwrap();
        assert_eq!(stored.trips_as_organizer, 0);
        assert!(db.get_trip(trip.id).await.unwrap().is_none());
        assert!(db.get_application(app.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capacity_limits_accept() {
        let db = MemoryDb::new();
        let organizer = user("org@example.com");
        db.create_user(&organizer).await.unwrap();
        let trip = trip(organizer.id, 1);
        db.create_trip(&trip).await.unwrap();

        let first = Application::new(Uuid::new_v4(), trip.id, String::new(), Utc::now());
        let second = Application::new(Uuid::new_v4(), trip.id, String::new(), Utc::now());
        db.create_application(&first).await.unwrap();
        db.create_application(&second).await.unwrap();

        let outcome = db
            .decide_application(first.id, Decision::Accept, Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, DecisionOutcome::Done(_)));

        let outcome = db
            .decide_application(second.id, Decision::Accept, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, DecisionOutcome::CapacityExceeded);

        let stored = db.get_trip(trip.id).await.unwrap().unwrap();
        assert_eq!(stored.participants, vec![first.user_id]);
    }

    #[tokio::test]
    async fn test_update_cannot_drop_below_participants() {
        let db = MemoryDb::new();
        let organizer = user("org@example.com");
        db.create_user(&organizer).await.unwrap();
        let mut trip = trip(organizer.id, 3);
        trip.participants = vec![Uuid::new_v4(), Uuid::new_v4()];
        db.create_trip(&trip).await.unwrap();

        let mut details = TripDetails {
            title: trip.title.clone(),
            destination: trip.destination.clone(),
            description: trip.description.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            price: trip.price,
            max_participants: 1,
            difficulty: trip.difficulty,
        };
        let outcome = db
            .update_trip_details(trip.id, &details, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, TripUpdateOutcome::BelowParticipants(2));

        details.max_participants = 2;
        let outcome = db
            .update_trip_details(trip.id, &details, Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, TripUpdateOutcome::Updated(t) if t.max_participants == 2));
    }

    #[tokio::test]
    async fn test_withdraw_only_pending() {
        let db = MemoryDb::new();
        let organizer = user("org@example.com");
        db.create_user(&organizer).await.unwrap();
        let trip = trip(organizer.id, 2);
        db.create_trip(&trip).await.unwrap();

        let app = Application::new(Uuid::new_v4(), trip.id, String::new(), Utc::now());
        db.create_application(&app).await.unwrap();
        db.decide_application(app.id, Decision::Reject, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            db.withdraw_application(app.id).await.unwrap(),
            DecisionOutcome::NotPending
        );
        assert_eq!(
            db.withdraw_application(Uuid::new_v4()).await.unwrap(),
            DecisionOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_set_status_keeps_cancellation() {
        let db = MemoryDb::new();
        let organizer = user("org@example.com");
        db.create_user(&organizer).await.unwrap();
        let mut trip = trip(organizer.id, 2);
        trip.status = TripStatus::Cancelled;
        db.create_trip(&trip).await.unwrap();

        db.set_trip_status(trip.id, TripStatus::Active).await.unwrap();
        let stored = db.get_trip(trip.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TripStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_no_lock_left_behind_for_deleted_trip() {
        let db = MemoryDb::new();
        let organizer = user("org@example.com");
        db.create_user(&organizer).await.unwrap();
        let trip = trip(organizer.id, 2);
        db.create_trip(&trip).await.unwrap();

        let app = Application::new(Uuid::new_v4(), trip.id, String::new(), Utc::now());
        db.create_application(&app).await.unwrap();
        assert_eq!(db.trip_locks.len(), 1);

        db.delete_trip(&trip).await.unwrap();
        assert!(db.trip_locks.is_empty());

        let err = db.create_application(&app).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Trip")));
        let details = TripDetails {
            title: trip.title.clone(),
            destination: trip.destination.clone(),
            description: trip.description.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            price: trip.price,
            max_participants: 2,
            difficulty: trip.difficulty,
        };
        let outcome = db
            .update_trip_details(trip.id, &details, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, TripUpdateOutcome::Missing);
        db.delete_trip(&trip).await.unwrap();

        assert!(db.trip_locks.is_empty());
    }
}

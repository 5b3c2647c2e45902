// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Store`] is implemented by [`FirestoreDb`] for production and by
//! [`MemoryDb`] for local development and tests. Every operation that must
//! touch several documents as a unit (trip decisions, trip edits, cascading
//! deletes) lives behind a single trait method so each backend can make it
//! atomic in its own way.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Application, RefreshTokenRecord, Trip, TripDetails, TripStatus, User};

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email claim documents (keyed by SHA-256 of the lowercased email) enforcing uniqueness
    pub const USER_EMAILS: &str = "user_emails";
    pub const TRIPS: &str = "trips";
    pub const APPLICATIONS: &str = "applications";
    /// Keyed by the SHA-256 digest of the refresh token
    pub const REFRESH_TOKENS: &str = "refresh_tokens";
}

/// User fields a profile update may write. Counters and back-references are
/// owned by the trip and application operations.
pub const PROFILE_FIELDS: [&str; 11] = [
    "passwordHash",
    "firstName",
    "lastName",
    "phone",
    "skills",
    "mainSkills",
    "allergies",
    "medicalConditions",
    "dietaryRestrictions",
    "aboutMe",
    "updatedAt",
];

/// What an organizer decided about a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Result of an atomic application transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// The transition happened; carries the application as written
    /// (or as it was just before deletion for a withdrawal).
    Done(Application),
    /// Application or its trip no longer exists
    Missing,
    /// Application already left `pending`
    NotPending,
    /// Trip is full
    CapacityExceeded,
}

/// Result of an atomic trip edit.
#[derive(Debug, Clone, PartialEq)]
pub enum TripUpdateOutcome {
    Updated(Trip),
    Missing,
    /// New capacity is below the number of accepted participants
    BelowParticipants(u32),
}

#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ──────────────────────────────────────────────────

    /// Insert a new user. Fails with [`AppError::DuplicateEmail`] if the
    /// (already lowercased) email is taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Write the [`PROFILE_FIELDS`] of `user`, leaving everything else as stored.
    async fn update_user_profile(&self, user: &User) -> Result<(), AppError>;

    /// Fetch several users; unknown IDs are skipped.
    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;

    // ─── Trips ──────────────────────────────────────────────────

    /// Insert a trip and credit it to its organizer.
    async fn create_trip(&self, trip: &Trip) -> Result<(), AppError>;

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, AppError>;

    async fn list_trips(&self) -> Result<Vec<Trip>, AppError>;

    async fn list_trips_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Trip>, AppError>;

    /// Replace a trip's editable fields unless the new capacity is below
    /// the current participant count.
    async fn update_trip_details(
        &self,
        id: Uuid,
        details: &TripDetails,
        now: DateTime<Utc>,
    ) -> Result<TripUpdateOutcome, AppError>;

    /// Persist a re-derived status.
    async fn set_trip_status(&self, id: Uuid, status: TripStatus) -> Result<(), AppError>;

    /// Delete a trip and its applications and undo the organizer's credit.
    async fn delete_trip(&self, trip: &Trip) -> Result<(), AppError>;

    // ─── Applications ───────────────────────────────────────────

    /// Create-only insert. Fails with [`AppError::DuplicateApplication`] if
    /// the ID exists and [`AppError::NotFound`] if the trip is gone.
    async fn create_application(&self, application: &Application) -> Result<(), AppError>;

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError>;

    async fn list_applications_by_user(&self, user_id: Uuid) -> Result<Vec<Application>, AppError>;

    async fn list_applications_for_trips(
        &self,
        trip_ids: &[Uuid],
    ) -> Result<Vec<Application>, AppError>;

    /// Accept or reject a pending application.
    ///
    /// Accepting also appends the applicant to the trip and updates the
    /// applicant's counters. The pending check, the capacity check and all
    /// writes happen as one unit.
    async fn decide_application(
        &self,
        id: Uuid,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, AppError>;

    /// Delete a still-pending application.
    async fn withdraw_application(&self, id: Uuid) -> Result<DecisionOutcome, AppError>;

    // ─── Refresh Tokens ─────────────────────────────────────────

    async fn put_refresh_token(
        &self,
        digest: &str,
        record: &RefreshTokenRecord,
    ) -> Result<(), AppError>;

    async fn get_refresh_token(&self, digest: &str)
        -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Idempotent.
    async fn delete_refresh_token(&self, digest: &str) -> Result<(), AppError>;
}

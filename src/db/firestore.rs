// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing [`Store`].
//!
//! Collections:
//! - `users` (profiles, counters, back-references)
//! - `user_emails` (one claim document per email, enforcing uniqueness)
//! - `trips`
//! - `applications` (document ID derived from applicant and trip)
//! - `refresh_tokens` (keyed by token digest)
//!
//! Multi-document units run in Firestore transactions. Reads inside a
//! transaction go through a client bound to the transaction so the documents
//! are locked until commit; a failed commit re-runs the whole unit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{collections, Decision, DecisionOutcome, Store, TripUpdateOutcome, PROFILE_FIELDS};
use crate::error::AppError;
use crate::models::{
    Application, ApplicationStatus, RefreshTokenRecord, Trip, TripDetails, TripStatus, User,
};

const MAX_CONCURRENT_DB_OPS: usize = 50;
const MAX_TRANSACTION_ATTEMPTS: usize = 5;

/// Claim document in `user_emails`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailClaim {
    user_id: Uuid,
    email: String,
}

#[derive(Serialize, Deserialize)]
struct StatusPatch {
    status: TripStatus,
}

/// Emails may contain characters that are not valid in document IDs.
fn email_key(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs no credentials; skip the credential lookup entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a database error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Transaction Helpers ────────────────────────────────────

    async fn begin(&self) -> Result<firestore::FirestoreTransaction<'_>, AppError> {
        self.get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Client whose reads participate in `transaction`.
    fn reader(
        &self,
        transaction: &firestore::FirestoreTransaction<'_>,
    ) -> Result<firestore::FirestoreDb, AppError> {
        Ok(self.get_client()?.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        ))
    }

    /// Commit, reporting contention as `false` so the caller can retry.
    async fn commit(transaction: firestore::FirestoreTransaction<'_>) -> bool {
        match transaction.commit().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Transaction commit failed");
                false
            }
        }
    }

    /// Run `attempt` until it commits. `Ok(None)` from an attempt means its
    /// commit failed and it should be re-run against fresh data.
    async fn with_retries<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Option<T>, AppError>>,
    {
        for n in 1..=MAX_TRANSACTION_ATTEMPTS {
            if let Some(result) = attempt().await? {
                return Ok(result);
            }
            tracing::debug!(operation, attempt = n, "Retrying transaction");
        }
        Err(AppError::Database(format!(
            "{}: transaction did not commit after {} attempts",
            operation, MAX_TRANSACTION_ATTEMPTS
        )))
    }

    // ─── Transactional Units ────────────────────────────────────

    async fn try_create_user(&self, user: &User) -> Result<Option<()>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;
        let key = email_key(&user.email);

        let claim: Option<EmailClaim> = reader
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if claim.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::DuplicateEmail);
        }

        let claim = EmailClaim {
            user_id: user.id,
            email: user.email.clone(),
        };
        client
            .fluent()
            .update()
            .in_col(collections::USER_EMAILS)
            .document_id(&key)
            .object(&claim)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;
        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction).await.then_some(()))
    }

    async fn try_create_trip(&self, trip: &Trip) -> Result<Option<()>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let organizer: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&trip.organizer_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut organizer) = organizer else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound("User"));
        };
        organizer.add_organized_trip(trip.id);

        client
            .fluent()
            .update()
            .in_col(collections::TRIPS)
            .document_id(trip.id.to_string())
            .object(trip)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;
        client
            .fluent()
            .update()
            .fields(["tripsAsOrganizer", "organizedTrips"])
            .in_col(collections::USERS)
            .document_id(organizer.id.to_string())
            .object(&organizer)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction).await.then_some(()))
    }

    async fn try_update_trip(
        &self,
        id: Uuid,
        details: &TripDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<TripUpdateOutcome>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let trip: Option<Trip> = reader
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut trip) = trip else {
            let _ = transaction.rollback().await;
            return Ok(Some(TripUpdateOutcome::Missing));
        };
        if details.max_participants < trip.current_participants() {
            let _ = transaction.rollback().await;
            return Ok(Some(TripUpdateOutcome::BelowParticipants(
                trip.current_participants(),
            )));
        }

        trip.apply_details(details.clone(), now);
        client
            .fluent()
            .update()
            .in_col(collections::TRIPS)
            .document_id(id.to_string())
            .object(&trip)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction)
            .await
            .then_some(TripUpdateOutcome::Updated(trip)))
    }

    /// Write `status` only if the trip still exists and is not cancelled.
    async fn try_set_status(&self, id: Uuid, status: TripStatus) -> Result<Option<()>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let trip: Option<Trip> = reader
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let unchanged = match &trip {
            None => true,
            Some(trip) => trip.status == TripStatus::Cancelled || trip.status == status,
        };
        if unchanged {
            let _ = transaction.rollback().await;
            return Ok(Some(()));
        }

        client
            .fluent()
            .update()
            .fields(["status"])
            .in_col(collections::TRIPS)
            .document_id(id.to_string())
            .object(&StatusPatch { status })
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction).await.then_some(()))
    }

    async fn try_delete_trip(&self, trip_id: Uuid) -> Result<Option<()>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let trip: Option<Trip> = reader
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(&trip_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(trip) = trip else {
            let _ = transaction.rollback().await;
            return Ok(Some(()));
        };

        let applications: Vec<Application> = reader
            .fluent()
            .select()
            .from(collections::APPLICATIONS)
            .filter(move |q| q.field("tripId").eq(trip_id.to_string()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let organizer: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&trip.organizer_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .delete()
            .from(collections::TRIPS)
            .document_id(trip_id.to_string())
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;
        for application in &applications {
            client
                .fluent()
                .delete()
                .from(collections::APPLICATIONS)
                .document_id(application.id.to_string())
                .add_to_transaction(&mut transaction)
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        if let Some(mut organizer) = organizer {
            organizer.remove_organized_trip(trip_id);
            client
                .fluent()
                .update()
                .fields(["tripsAsOrganizer", "organizedTrips"])
                .in_col(collections::USERS)
                .document_id(organizer.id.to_string())
                .object(&organizer)
                .add_to_transaction(&mut transaction)
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        if !Self::commit(transaction).await {
            return Ok(None);
        }
        tracing::debug!(
            trip_id = %trip_id,
            applications = applications.len(),
            "Deleted trip and its applications"
        );
        Ok(Some(()))
    }

    async fn try_create_application(
        &self,
        application: &Application,
    ) -> Result<Option<()>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let trip: Option<Trip> = reader
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(&application.trip_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if trip.is_none() {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound("Trip"));
        }

        let existing: Option<Application> = reader
            .fluent()
            .select()
            .by_id_in(collections::APPLICATIONS)
            .obj()
            .one(&application.id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if existing.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::DuplicateApplication);
        }

        client
            .fluent()
            .update()
            .in_col(collections::APPLICATIONS)
            .document_id(application.id.to_string())
            .object(application)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction).await.then_some(()))
    }

    async fn try_decide(
        &self,
        id: Uuid,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<Option<DecisionOutcome>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let application: Option<Application> = reader
            .fluent()
            .select()
            .by_id_in(collections::APPLICATIONS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(mut application) = application else {
            let _ = transaction.rollback().await;
            return Ok(Some(DecisionOutcome::Missing));
        };
        if !application.is_pending() {
            let _ = transaction.rollback().await;
            return Ok(Some(DecisionOutcome::NotPending));
        }

        match decision {
            Decision::Reject => application.decide(ApplicationStatus::Rejected, now),
            Decision::Accept => {
                let trip: Option<Trip> = reader
                    .fluent()
                    .select()
                    .by_id_in(collections::TRIPS)
                    .obj()
                    .one(&application.trip_id.to_string())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                let Some(mut trip) = trip else {
                    let _ = transaction.rollback().await;
                    return Ok(Some(DecisionOutcome::Missing));
                };
                if !trip.has_capacity() {
                    let _ = transaction.rollback().await;
                    return Ok(Some(DecisionOutcome::CapacityExceeded));
                }

                let applicant: Option<User> = reader
                    .fluent()
                    .select()
                    .by_id_in(collections::USERS)
                    .obj()
                    .one(&application.user_id.to_string())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                if !trip.is_participant(application.user_id) {
                    trip.participants.push(application.user_id);
                }
                trip.updated_at = now;
                client
                    .fluent()
                    .update()
                    .fields(["participants", "updatedAt"])
                    .in_col(collections::TRIPS)
                    .document_id(trip.id.to_string())
                    .object(&trip)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| AppError::Database(e.to_string()))?;

                if let Some(mut applicant) = applicant {
                    applicant.add_joined_trip(trip.id);
                    client
                        .fluent()
                        .update()
                        .fields(["tripsAsParticipant", "joinedTrips"])
                        .in_col(collections::USERS)
                        .document_id(applicant.id.to_string())
                        .object(&applicant)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }

                application.decide(ApplicationStatus::Accepted, now);
            }
        }

        client
            .fluent()
            .update()
            .in_col(collections::APPLICATIONS)
            .document_id(id.to_string())
            .object(&application)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction)
            .await
            .then_some(DecisionOutcome::Done(application)))
    }

    async fn try_withdraw(&self, id: Uuid) -> Result<Option<DecisionOutcome>, AppError> {
        let client = self.get_client()?;
        let mut transaction = self.begin().await?;
        let reader = self.reader(&transaction)?;

        let application: Option<Application> = reader
            .fluent()
            .select()
            .by_id_in(collections::APPLICATIONS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(application) = application else {
            let _ = transaction.rollback().await;
            return Ok(Some(DecisionOutcome::Missing));
        };
        if !application.is_pending() {
            let _ = transaction.rollback().await;
            return Ok(Some(DecisionOutcome::NotPending));
        }

        client
            .fluent()
            .delete()
            .from(collections::APPLICATIONS)
            .document_id(id.to_string())
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::commit(transaction)
            .await
            .then_some(DecisionOutcome::Done(application)))
    }

    async fn query_applications(
        &self,
        field: &'static str,
        value: Uuid,
    ) -> Result<Vec<Application>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::APPLICATIONS)
            .filter(move |q| q.field(field).eq(value.to_string()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.with_retries("create_user", move || self.try_create_user(user))
            .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let claim: Option<EmailClaim> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&email_key(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match claim {
            Some(claim) => self.get_user(claim.user_id).await,
            None => Ok(None),
        }
    }

    async fn update_user_profile(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(PROFILE_FIELDS)
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let results: Vec<Result<Option<User>, AppError>> = stream::iter(ids.iter().copied())
            .map(|id| self.get_user(id))
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut users = Vec::with_capacity(results.len());
        for result in results {
            if let Some(user) = result? {
                users.push(user);
            }
        }
        Ok(users)
    }

    // ─── Trip Operations ─────────────────────────────────────────

    async fn create_trip(&self, trip: &Trip) -> Result<(), AppError> {
        self.with_retries("create_trip", move || self.try_create_trip(trip))
            .await
    }

    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_trips_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("organizerId").eq(organizer_id.to_string()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_trip_details(
        &self,
        id: Uuid,
        details: &TripDetails,
        now: DateTime<Utc>,
    ) -> Result<TripUpdateOutcome, AppError> {
        self.with_retries("update_trip_details", move || {
            self.try_update_trip(id, details, now)
        })
        .await
    }

    async fn set_trip_status(&self, id: Uuid, status: TripStatus) -> Result<(), AppError> {
        self.with_retries("set_trip_status", move || self.try_set_status(id, status))
            .await
    }

    async fn delete_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let trip_id = trip.id;
        self.with_retries("delete_trip", move || self.try_delete_trip(trip_id))
            .await
    }

    // ─── Application Operations ──────────────────────────────────

    async fn create_application(&self, application: &Application) -> Result<(), AppError> {
        self.with_retries("create_application", move || {
            self.try_create_application(application)
        })
        .await
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::APPLICATIONS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_applications_by_user(&self, user_id: Uuid) -> Result<Vec<Application>, AppError> {
        self.query_applications("userId", user_id).await
    }

    async fn list_applications_for_trips(
        &self,
        trip_ids: &[Uuid],
    ) -> Result<Vec<Application>, AppError> {
        let results: Vec<Result<Vec<Application>, AppError>> =
            stream::iter(trip_ids.iter().copied())
                .map(|trip_id| self.query_applications("tripId", trip_id))
                .buffer_unordered(MAX_CONCURRENT_DB_OPS)
                .collect()
                .await;

        let mut applications = Vec::new();
        for result in results {
            applications.extend(result?);
        }
        Ok(applications)
    }

    async fn decide_application(
        &self,
        id: Uuid,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<DecisionOutcome, AppError> {
        self.with_retries("decide_application", move || {
            self.try_decide(id, decision, now)
        })
        .await
    }

    async fn withdraw_application(&self, id: Uuid) -> Result<DecisionOutcome, AppError> {
        self.with_retries("withdraw_application", move || self.try_withdraw(id))
            .await
    }

    // ─── Refresh Token Operations ────────────────────────────────

    async fn put_refresh_token(
        &self,
        digest: &str,
        record: &RefreshTokenRecord,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::REFRESH_TOKENS)
            .document_id(digest)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_refresh_token(
        &self,
        digest: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REFRESH_TOKENS)
            .obj()
            .one(digest)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_refresh_token(&self, digest: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::REFRESH_TOKENS)
            .document_id(digest)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_key_is_stable_hex() {
        let key = email_key("anna@example.com");
        assert_eq!(key.len(), 64);
        assert_eq!(key, email_key("anna@example.com"));
        assert!(!key.contains('/'));
    }

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.get_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}

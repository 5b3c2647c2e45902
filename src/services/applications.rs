// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application workflow.
//!
//! ```text
//! none ──apply──▶ pending ──accept──▶ accepted
//!   ▲                │
//!   └───withdraw─────┴──reject──▶ rejected
//! ```
//!
//! Accepted and rejected are terminal. Preconditions are checked here in a
//! fixed order so callers see a predictable error; the store re-checks the
//! state-dependent ones (pending, capacity, uniqueness) atomically with the
//! write.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use uuid::Uuid;

use crate::db::{Decision, DecisionOutcome, Store};
use crate::error::AppError;
use crate::models::application::normalize_message;
use crate::models::{
    ApplicantSummary, Application, ApplicationDetails, ApplicationStatus, Trip, TripSummary,
};

pub struct ApplicationWorkflow {
    db: Arc<dyn Store>,
}

impl ApplicationWorkflow {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// Ask to join a trip.
    pub async fn apply(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
        message: Option<String>,
    ) -> Result<Application, AppError> {
        let trip = self
            .db
            .get_trip(trip_id)
            .await?
            .ok_or(AppError::NotFound("Trip"))?;
        if trip.organizer_id == user_id {
            return Err(AppError::InvalidOperation(
                "Organizer cannot apply to their own trip",
            ));
        }
        if trip.is_participant(user_id) {
            return Err(AppError::InvalidOperation(
                "You are already a participant of this trip",
            ));
        }
        if self
            .db
            .get_application(Application::id_for(user_id, trip_id))
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateApplication);
        }
        let message = normalize_message(message)?;

        let application = Application::new(user_id, trip_id, message, Utc::now());
        self.db.create_application(&application).await?;

        tracing::info!(
            application_id = %application.id,
            trip_id = %trip_id,
            user_id = %user_id,
            "Application submitted"
        );
        Ok(application)
    }

    /// Accept a pending application, adding the applicant to the trip.
    pub async fn accept(&self, id: Uuid, actor_id: Uuid) -> Result<ApplicationDetails, AppError> {
        self.decide(id, actor_id, Decision::Accept).await
    }

    /// Reject a pending application. Nothing else changes.
    pub async fn reject(&self, id: Uuid, actor_id: Uuid) -> Result<ApplicationDetails, AppError> {
        self.decide(id, actor_id, Decision::Reject).await
    }

    async fn decide(
        &self,
        id: Uuid,
        actor_id: Uuid,
        decision: Decision,
    ) -> Result<ApplicationDetails, AppError> {
        let application = self
            .db
            .get_application(id)
            .await?
            .ok_or(AppError::NotFound("Application"))?;
        let trip = self
            .db
            .get_trip(application.trip_id)
            .await?
            .ok_or(AppError::NotFound("Trip"))?;
        if trip.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the organizer can review applications",
            ));
        }
        if !application.is_pending() {
            return Err(AppError::InvalidOperation("Application already processed"));
        }
        if decision == Decision::Accept && !trip.has_capacity() {
            return Err(AppError::CapacityExceeded);
        }

        let decided = match self.db.decide_application(id, decision, Utc::now()).await? {
            DecisionOutcome::Done(app) => app,
            DecisionOutcome::Missing => return Err(AppError::NotFound("Application")),
            DecisionOutcome::NotPending => {
                return Err(AppError::InvalidOperation("Application already processed"))
            }
            DecisionOutcome::CapacityExceeded => return Err(AppError::CapacityExceeded),
        };

        tracing::info!(
            application_id = %id,
            trip_id = %decided.trip_id,
            status = ?decided.status,
            "Application reviewed"
        );

        let trip = self.db.get_trip(decided.trip_id).await?;
        let mut detailed =
            attach_details(self.db.as_ref(), vec![decided], trip.as_slice()).await?;
        detailed
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("decided application vanished")))
    }

    /// Withdraw one's own pending application.
    pub async fn withdraw(&self, id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        let application = self
            .db
            .get_application(id)
            .await?
            .ok_or(AppError::NotFound("Application"))?;
        if application.user_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the applicant can withdraw this application",
            ));
        }
        if !application.is_pending() {
            return Err(AppError::InvalidOperation("Application already processed"));
        }

        match self.db.withdraw_application(id).await? {
            DecisionOutcome::Done(_) => {
                tracing::info!(application_id = %id, "Application withdrawn");
                Ok(())
            }
            DecisionOutcome::Missing => Err(AppError::NotFound("Application")),
            DecisionOutcome::NotPending | DecisionOutcome::CapacityExceeded => {
                Err(AppError::InvalidOperation("Application already processed"))
            }
        }
    }

    /// The user's own applications, newest first, with their trips.
    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<ApplicationDetails>, AppError> {
        let mut applications = self.db.list_applications_by_user(user_id).await?;
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

        let trip_ids: HashSet<Uuid> = applications.iter().map(|a| a.trip_id).collect();
        let trips: Vec<Trip> = try_join_all(trip_ids.into_iter().map(|id| self.db.get_trip(id)))
            .await?
            .into_iter()
            .flatten()
            .collect();

        // The applicant is the caller, so only the trip is attached.
        Ok(applications
            .into_iter()
            .map(|application| ApplicationDetails {
                applicant: None,
                trip: trips
                    .iter()
                    .find(|t| t.id == application.trip_id)
                    .map(TripSummary::from),
                application,
            })
            .collect())
    }

    /// Pending and rejected applications on trips the user organizes.
    pub async fn list_for_organizer(
        &self,
        organizer_id: Uuid,
    ) -> Result<Vec<ApplicationDetails>, AppError> {
        let trips = self.db.list_trips_by_organizer(organizer_id).await?;
        if trips.is_empty() {
            return Ok(Vec::new());
        }
        let trip_ids: Vec<Uuid> = trips.iter().map(|t| t.id).collect();

        let mut applications: Vec<Application> = self
            .db
            .list_applications_for_trips(&trip_ids)
            .await?
            .into_iter()
            .filter(|a| a.status != ApplicationStatus::Accepted)
            .collect();
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

        attach_details(self.db.as_ref(), applications, &trips).await
    }

    /// The user's application to `trip_id`, if any.
    pub async fn check_existing(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
    ) -> Result<Option<Application>, AppError> {
        self.db
            .get_application(Application::id_for(user_id, trip_id))
            .await
    }
}

/// Pair each application with its applicant and, when present in `trips`,
/// its trip. Order is preserved.
pub(crate) async fn attach_details(
    db: &dyn Store,
    applications: Vec<Application>,
    trips: &[Trip],
) -> Result<Vec<ApplicationDetails>, AppError> {
    let user_ids: Vec<Uuid> = applications
        .iter()
        .map(|a| a.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let users: HashMap<Uuid, ApplicantSummary> = db
        .get_users(&user_ids)
        .await?
        .iter()
        .map(|u| (u.id, ApplicantSummary::from(u)))
        .collect();

    Ok(applications
        .into_iter()
        .map(|application| ApplicationDetails {
            applicant: users.get(&application.user_id).cloned(),
            trip: trips
                .iter()
                .find(|t| t.id == application.trip_id)
                .map(TripSummary::from),
            application,
        })
        .collect())
}

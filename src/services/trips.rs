// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip registry: creation, listing, edits and deletion.
//!
//! Status is derived from the dates on every read. When the derived status
//! differs from the stored one it is written back, but a failed write-back
//! never fails the read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Store, TripUpdateOutcome};
use crate::error::AppError;
use crate::models::{
    ApplicationStatus, ParticipantSummary, Trip, TripApplications, TripFilter, TripInput,
};
use crate::services::applications::attach_details;

pub struct TripRegistry {
    db: Arc<dyn Store>,
}

impl TripRegistry {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn create(&self, organizer_id: Uuid, input: TripInput) -> Result<Trip, AppError> {
        let details = input.into_details()?;
        let now = Utc::now();
        let mut trip = Trip::new(organizer_id, details, now);
        trip.refresh_status(now);

        self.db.create_trip(&trip).await?;

        tracing::info!(trip_id = %trip.id, organizer_id = %organizer_id, "Trip created");
        Ok(trip)
    }

    /// Trips matching `filter`, newest first.
    pub async fn list(&self, filter: &TripFilter) -> Result<Vec<Trip>, AppError> {
        filter.validate()?;
        let now = Utc::now();

        let mut trips = self.db.list_trips().await?;
        for trip in trips.iter_mut() {
            self.refresh_status(trip, now).await;
        }
        trips.retain(|trip| filter.matches(trip));
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    pub async fn get(&self, id: Uuid) -> Result<Trip, AppError> {
        let mut trip = self
            .db
            .get_trip(id)
            .await?
            .ok_or(AppError::NotFound("Trip"))?;
        self.refresh_status(&mut trip, Utc::now()).await;
        Ok(trip)
    }

    /// Replace the editable fields of a trip. Only its organizer may do this.
    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        input: TripInput,
    ) -> Result<Trip, AppError> {
        let trip = self.get(id).await?;
        if trip.organizer_id != actor_id {
            return Err(AppError::Forbidden("Only the organizer can edit this trip"));
        }
        let details = input.into_details()?;
        let now = Utc::now();

        match self.db.update_trip_details(id, &details, now).await? {
            TripUpdateOutcome::Updated(mut trip) => {
                self.refresh_status(&mut trip, now).await;
                tracing::info!(trip_id = %id, "Trip updated");
                Ok(trip)
            }
            TripUpdateOutcome::Missing => Err(AppError::NotFound("Trip")),
            TripUpdateOutcome::BelowParticipants(current) => Err(AppError::Validation(vec![
                format!(
                    "maxParticipants: must be at least the current participant count ({})",
                    current
                ),
            ])),
        }
    }

    /// Delete a trip along with its applications. Only its organizer may do this.
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), AppError> {
        let trip = self
            .db
            .get_trip(id)
            .await?
            .ok_or(AppError::NotFound("Trip"))?;
        if trip.organizer_id != actor_id {
            return Err(AppError::Forbidden("Only the organizer can delete this trip"));
        }

        self.db.delete_trip(&trip).await?;

        tracing::info!(trip_id = %id, "Trip deleted");
        Ok(())
    }

    /// Public profile subset of every accepted participant.
    pub async fn participants(&self, id: Uuid) -> Result<Vec<ParticipantSummary>, AppError> {
        let trip = self
            .db
            .get_trip(id)
            .await?
            .ok_or(AppError::NotFound("Trip"))?;

        let users = self.db.get_users(&trip.participants).await?;
        // Keep the order in which participants were accepted.
        Ok(trip
            .participants
            .iter()
            .filter_map(|pid| users.iter().find(|u| u.id == *pid))
            .map(ParticipantSummary::from)
            .collect())
    }

    /// Applications to a trip, for its organizer. Accepted applicants already
    /// show up as participants.
    pub async fn applications(
        &self,
        id: Uuid,
        actor_id: Uuid,
    ) -> Result<TripApplications, AppError> {
        let trip = self.get(id).await?;
        if trip.organizer_id != actor_id {
            return Err(AppError::Forbidden(
                "Only the organizer can view applications for this trip",
            ));
        }

        let mut applications = self.db.list_applications_for_trips(&[id]).await?;
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        let detailed = attach_details(self.db.as_ref(), applications, &[trip]).await?;

        let mut grouped = TripApplications::default();
        for app in detailed {
            match app.application.status {
                ApplicationStatus::Pending => grouped.pending.push(app),
                ApplicationStatus::Rejected => grouped.rejected.push(app),
                ApplicationStatus::Accepted => {}
            }
        }
        Ok(grouped)
    }

    async fn refresh_status(&self, trip: &mut Trip, now: DateTime<Utc>) {
        if !trip.refresh_status(now) {
            return;
        }
        if let Err(e) = self.db.set_trip_status(trip.id, trip.status).await {
            tracing::warn!(trip_id = %trip.id, error = %e, "Failed to persist derived trip status");
        }
    }
}

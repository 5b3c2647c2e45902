// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip applications and their review state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::trip::{Trip, TripStatus};
use crate::models::user::User;

pub const MAX_MESSAGE_LEN: usize = 500;

/// Namespace for deriving application IDs from (applicant, trip).
const APPLICATION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_3a52_8d4e_4b7a_9c0f_5e2d_71a8_b3c4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A user's request to join a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Application {
    /// Derived from (applicant, trip); see [`Application::id_for`]
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_id: Uuid,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub message: String,
    pub applied_at: DateTime<Utc>,
    /// Set when the application leaves `pending`
    pub processed_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Stable ID for the (applicant, trip) pair.
    ///
    /// Storage inserts are create-only, so a second application for the same
    /// pair collides on this key.
    pub fn id_for(user_id: Uuid, trip_id: Uuid) -> Uuid {
        let mut name = [0u8; 32];
        name[..16].copy_from_slice(user_id.as_bytes());
        name[16..].copy_from_slice(trip_id.as_bytes());
        Uuid::new_v5(&APPLICATION_NAMESPACE, &name)
    }

    pub fn new(user_id: Uuid, trip_id: Uuid, message: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::id_for(user_id, trip_id),
            user_id,
            trip_id,
            status: ApplicationStatus::Pending,
            message,
            applied_at: now,
            processed_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    /// Move out of `pending`. Callers check [`Application::is_pending`] first.
    pub fn decide(&mut self, status: ApplicationStatus, now: DateTime<Utc>) {
        self.status = status;
        self.processed_at = Some(now);
    }
}

/// Body of `POST /api/applications`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInput {
    pub trip_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Trim the message and enforce its length limit.
pub fn normalize_message(message: Option<String>) -> Result<String, AppError> {
    let message = message.map(|m| m.trim().to_string()).unwrap_or_default();
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(vec![
            "message: must be at most 500 characters".to_string(),
        ]));
    }
    Ok(message)
}

/// Applicant fields shown to organizers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub main_skills: Vec<String>,
}

impl From<&User> for ApplicantSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            skills: user.skills.clone(),
            main_skills: user.main_skills.clone(),
        }
    }
}

/// Trip fields shown alongside an application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: Uuid,
    pub title: String,
    pub destination: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: TripStatus,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            title: trip.title.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            status: trip.status,
        }
    }
}

/// Application with the related applicant and trip filled in when they exist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    #[serde(flatten)]
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripSummary>,
}

/// A trip's applications split by review state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TripApplications {
    pub pending: Vec<ApplicationDetails>,
    pub rejected: Vec<ApplicationDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_stable_per_pair() {
        let user = Uuid::new_v4();
        let trip = Uuid::new_v4();

        assert_eq!(Application::id_for(user, trip), Application::id_for(user, trip));
        assert_ne!(Application::id_for(user, trip), Application::id_for(trip, user));
        assert_ne!(
            Application::id_for(user, trip),
            Application::id_for(user, Uuid::new_v4())
        );
    }

    #[test]
    fn test_new_application_is_pending() {
        let now = Utc::now();
        let app = Application::new(Uuid::new_v4(), Uuid::new_v4(), String::new(), now);

        assert!(app.is_pending());
        assert_eq!(app.applied_at, now);
        assert!(app.processed_at.is_none());
    }

    #[test]
    fn test_decide_sets_processed_at() {
        let now = Utc::now();
        let mut app = Application::new(Uuid::new_v4(), Uuid::new_v4(), String::new(), now);

        app.decide(ApplicationStatus::Rejected, now);

        assert!(!app.is_pending());
        assert_eq!(app.processed_at, Some(now));
    }

    #[test]
    fn test_message_limit() {
        assert_eq!(normalize_message(None).unwrap(), "");
        assert_eq!(normalize_message(Some("  hi ".into())).unwrap(), "hi");
        assert!(normalize_message(Some("я".repeat(500))).is_ok());
        assert!(matches!(
            normalize_message(Some("x".repeat(501))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_wire_shape() {
        let app = Application::new(Uuid::new_v4(), Uuid::new_v4(), "hello".into(), Utc::now());
        let json = serde_json::to_value(&app).unwrap();

        assert_eq!(json["status"], "pending");
        assert!(json.get("tripId").is_some());
        assert!(json["processedAt"].is_null());
    }
}

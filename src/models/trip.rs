// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip model, lifecycle status derivation and list filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

use crate::error::{field_messages, AppError};

pub const MAX_TITLE_LEN: u64 = 100;
pub const MAX_DESCRIPTION_LEN: u64 = 1000;
pub const MIN_PARTICIPANTS: u32 = 1;
pub const MAX_PARTICIPANTS: u32 = 50;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle status of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum TripStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "planning" => Ok(TripStatus::Planning),
            "active" => Ok(TripStatus::Active),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// Stored trip record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Trip {
    /// Trip ID (also used as document ID)
    pub id: Uuid,
    pub title: String,
    pub destination: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: f64,
    pub max_participants: u32,
    pub difficulty: Difficulty,
    /// Owning user; never changes after creation
    pub organizer_id: Uuid,
    /// Accepted applicants
    #[serde(default)]
    pub participants: Vec<Uuid>,
    /// Last persisted status; see [`derive_status`]
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status a trip should have at `now`.
///
/// Cancelled is sticky; otherwise both ends of the date range count as active.
pub fn derive_status(now: DateTime<Utc>, trip: &Trip) -> TripStatus {
    if trip.status == TripStatus::Cancelled {
        return TripStatus::Cancelled;
    }
    if now < trip.start_date {
        TripStatus::Planning
    } else if now <= trip.end_date {
        TripStatus::Active
    } else {
        TripStatus::Completed
    }
}

impl Trip {
    /// Build a new trip in the planning state from validated details.
    pub fn new(organizer_id: Uuid, details: TripDetails, now: DateTime<Utc>) -> Self {
        let mut trip = Self {
            id: Uuid::new_v4(),
            title: String::new(),
            destination: String::new(),
            description: String::new(),
            start_date: details.start_date,
            end_date: details.end_date,
            price: 0.0,
            max_participants: MIN_PARTICIPANTS,
            difficulty: Difficulty::default(),
            organizer_id,
            participants: Vec::new(),
            status: TripStatus::Planning,
            created_at: now,
            updated_at: now,
        };
        trip.apply_details(details, now);
        trip
    }

    /// Overwrite the editable fields. Organizer, participants and status are untouched.
    pub fn apply_details(&mut self, details: TripDetails, now: DateTime<Utc>) {
        self.title = details.title;
        self.destination = details.destination;
        self.description = details.description;
        self.start_date = details.start_date;
        self.end_date = details.end_date;
        self.price = details.price;
        self.max_participants = details.max_participants;
        self.difficulty = details.difficulty;
        self.updated_at = now;
    }

    pub fn current_participants(&self) -> u32 {
        self.participants.len() as u32
    }

    pub fn available_spots(&self) -> u32 {
        self.max_participants
            .saturating_sub(self.current_participants())
    }

    pub fn has_capacity(&self) -> bool {
        self.current_participants() < self.max_participants
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Length of the trip in whole days, rounded up.
    pub fn duration_days(&self) -> i64 {
        let millis = (self.end_date - self.start_date).num_milliseconds().max(0);
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }

    /// Re-derive the status in place. Returns `true` if it changed.
    pub fn refresh_status(&mut self, now: DateTime<Utc>) -> bool {
        let derived = derive_status(now, self);
        if derived == self.status {
            return false;
        }
        self.status = derived;
        true
    }
}

/// Trip as returned by the API, with derived counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TripView {
    #[serde(flatten)]
    pub trip: Trip,
    pub current_participants: u32,
    pub available_spots: u32,
    pub duration_days: i64,
}

impl From<Trip> for TripView {
    fn from(trip: Trip) -> Self {
        Self {
            current_participants: trip.current_participants(),
            available_spots: trip.available_spots(),
            duration_days: trip.duration_days(),
            trip,
        }
    }
}

/// Validated, editable trip fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TripDetails {
    pub title: String,
    pub destination: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: f64,
    pub max_participants: u32,
    pub difficulty: Difficulty,
}

/// Trip fields as submitted by a client. Everything is optional here so that
/// missing fields are reported alongside the other violations.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TripInput {
    #[validate(
        required(message = "is required"),
        length(min = 1, max = MAX_TITLE_LEN, message = "must be 1-100 characters")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 1, message = "must not be empty")
    )]
    pub destination: Option<String>,
    #[validate(
        required(message = "is required"),
        length(
            min = 1,
            max = MAX_DESCRIPTION_LEN,
            message = "must be 1-1000 characters"
        )
    )]
    pub description: Option<String>,
    #[validate(required(message = "is required"))]
    pub start_date: Option<DateTime<Utc>>,
    #[validate(required(message = "is required"))]
    pub end_date: Option<DateTime<Utc>>,
    #[validate(
        required(message = "is required"),
        range(min = 0.0, message = "must not be negative")
    )]
    pub price: Option<f64>,
    #[validate(
        required(message = "is required"),
        range(
            min = MIN_PARTICIPANTS,
            max = MAX_PARTICIPANTS,
            message = "must be between 1 and 50"
        )
    )]
    pub max_participants: Option<u32>,
    pub difficulty: Option<Difficulty>,
}

impl TripInput {
    /// Trim, validate every field and produce [`TripDetails`].
    pub fn into_details(mut self) -> Result<TripDetails, AppError> {
        for field in [
            &mut self.title,
            &mut self.destination,
            &mut self.description,
        ] {
            if let Some(value) = field {
                *value = value.trim().to_string();
            }
        }

        let mut problems = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => field_messages(&errors),
        };
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                problems.push("endDate: must not be before startDate".to_string());
            }
        }
        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }

        match self {
            TripInput {
                title: Some(title),
                destination: Some(destination),
                description: Some(description),
                start_date: Some(start_date),
                end_date: Some(end_date),
                price: Some(price),
                max_participants: Some(max_participants),
                difficulty,
            } => Ok(TripDetails {
                title,
                destination,
                description,
                start_date,
                end_date,
                price,
                max_participants,
                difficulty: difficulty.unwrap_or_default(),
            }),
            _ => Err(AppError::Validation(vec![
                "trip: required fields are missing".to_string()
            ])),
        }
    }
}

/// Filters for the public trip listing. All present filters must match.
#[derive(Debug, Clone)]
pub struct TripFilter {
    /// Case-insensitive substring of the destination
    pub destination: Option<String>,
    /// Earliest start date
    pub start_date: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub difficulty: Option<Vec<Difficulty>>,
    /// Allowed (derived) statuses
    pub status: Vec<TripStatus>,
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
}

impl Default for TripFilter {
    fn default() -> Self {
        Self {
            destination: None,
            start_date: None,
            min_price: None,
            max_price: None,
            difficulty: None,
            status: vec![TripStatus::Planning, TripStatus::Active],
            min_duration: None,
            max_duration: None,
        }
    }
}

impl TripFilter {
    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::Validation(vec![
                    "minPrice: must not be greater than maxPrice".to_string(),
                ]));
            }
        }
        Ok(())
    }

    /// Whether `trip` passes every filter. `trip.status` must already be derived.
    pub fn matches(&self, trip: &Trip) -> bool {
        if let Some(needle) = &self.destination {
            if !trip
                .destination
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if trip.start_date < start {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| trip.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| trip.price > max) {
            return false;
        }
        if let Some(levels) = &self.difficulty {
            if !levels.contains(&trip.difficulty) {
                return false;
            }
        }
        if !self.status.contains(&trip.status) {
            return false;
        }

        let days = trip.duration_days();
        if self.min_duration.is_some_and(|min| days < min) {
            return false;
        }
        if self.max_duration.is_some_and(|max| days > max) {
            return false;
        }
        true
    }
}

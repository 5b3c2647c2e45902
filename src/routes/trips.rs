// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip routes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use super::{parse_id, ApiResponse, MessageResponse};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ParticipantSummary, TripApplications, TripFilter, TripInput, TripView};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trips", get(list_trips))
        .route("/api/trips/{id}", get(get_trip))
        .route("/api/trips/{id}/participants", get(get_participants))
}

/// Routes behind the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trips", post(create_trip))
        .route("/api/trips/{id}", put(update_trip).delete(delete_trip))
        .route("/api/trips/{id}/applications", get(get_trip_applications))
}

// ─── Listing ─────────────────────────────────────────────────

/// Query parameters for the trip list. Lists are comma-separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripListQuery {
    destination: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    start_date: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    difficulty: Option<String>,
    status: Option<String>,
    min_duration: Option<String>,
    max_duration: Option<String>,
}

impl TripListQuery {
    /// Parse into a [`TripFilter`], reporting every bad parameter at once.
    pub fn into_filter(self) -> Result<TripFilter> {
        let mut problems = Vec::new();
        let mut filter = TripFilter {
            destination: self
                .destination
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..TripFilter::default()
        };

        if let Some(raw) = non_empty(&self.start_date) {
            match parse_date(raw) {
                Some(date) => filter.start_date = Some(date),
                None => problems.push("startDate: must be a date".to_string()),
            }
        }

        let min_price = parse_number::<f64>("minPrice", &self.min_price, &mut problems);
        let max_price = parse_number::<f64>("maxPrice", &self.max_price, &mut problems);
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                problems.push("minPrice: must not be greater than maxPrice".to_string());
            }
        }
        // Negative bounds are ignored rather than rejected.
        filter.min_price = min_price.filter(|p| *p >= 0.0);
        filter.max_price = max_price.filter(|p| *p >= 0.0);

        if let Some(raw) = non_empty(&self.difficulty) {
            filter.difficulty = Some(parse_list("difficulty", raw, &mut problems));
        }
        if let Some(raw) = non_empty(&self.status) {
            filter.status = parse_list("status", raw, &mut problems);
        }

        filter.min_duration = parse_number("minDuration", &self.min_duration, &mut problems);
        filter.max_duration = parse_number("maxDuration", &self.max_duration, &mut problems);

        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }
        Ok(filter)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_number<T: FromStr>(
    name: &str,
    value: &Option<String>,
    problems: &mut Vec<String>,
) -> Option<T> {
    let raw = non_empty(value)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            problems.push(format!("{}: must be a number", name));
            None
        }
    }
}

fn parse_list<T: FromStr<Err = String>>(
    name: &str,
    raw: &str,
    problems: &mut Vec<String>,
) -> Vec<T> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                problems.push(format!("{}: {}", name, e));
                None
            }
        })
        .collect()
}

async fn list_trips(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<TripListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<TripView>>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;

    let trips = state.trips.list(&filter).await?;
    Ok(ApiResponse::list(
        trips.into_iter().map(TripView::from).collect(),
    ))
}

// ─── Single Trip ─────────────────────────────────────────────

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripView>>> {
    let trip = state.trips.get(parse_id(&id)?).await?;
    Ok(ApiResponse::new(TripView::from(trip)))
}

async fn get_participants(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ParticipantSummary>>>> {
    let participants = state.trips.participants(parse_id(&id)?).await?;
    Ok(ApiResponse::list(participants))
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<TripInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TripView>>)> {
    let Json(input) = payload?;
    let trip = state.trips.create(user.id, input).await?;

    Ok((StatusCode::CREATED, ApiResponse::new(TripView::from(trip))))
}

async fn update_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TripInput>, JsonRejection>,
) -> Result<Json<ApiResponse<TripView>>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let trip = state.trips.update(id, user.id, input).await?;

    Ok(ApiResponse::new(TripView::from(trip)))
}

async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.trips.delete(parse_id(&id)?, user.id).await?;
    Ok(MessageResponse::new("Trip deleted"))
}

async fn get_trip_applications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripApplications>>> {
    let applications = state.trips.applications(parse_id(&id)?, user.id).await?;
    Ok(ApiResponse::new(applications))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, TripStatus};
    use chrono::TimeZone;

    fn query(pairs: &[(&str, &str)]) -> TripListQuery {
        let params: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(params)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let filter = TripListQuery::default().into_filter().unwrap();
        assert_eq!(filter.status, vec![TripStatus::Planning, TripStatus::Active]);
        assert!(filter.difficulty.is_none());
    }

    #[test]
    fn test_parses_lists_and_dates() {
        let filter = query(&[
            ("difficulty", "easy, hard"),
            ("status", "completed"),
            ("startDate", "2025-06-01"),
            ("minDuration", "3"),
        ])
        .into_filter()
        .unwrap();

        assert_eq!(
            filter.difficulty,
            Some(vec![Difficulty::Easy, Difficulty::Hard])
        );
        assert_eq!(filter.status, vec![TripStatus::Completed]);
        assert_eq!(
            filter.start_date,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(filter.min_duration, Some(3));
    }

    #[test]
    fn test_negative_price_ignored() {
        let filter = query(&[("minPrice", "-5"), ("maxPrice", "100")])
            .into_filter()
            .unwrap();
        assert_eq!(filter.min_price, None);
        assert_eq!(filter.max_price, Some(100.0));
    }

    #[test]
    fn test_bad_parameters_reported_together() {
        let err = query(&[
            ("minPrice", "500"),
            ("maxPrice", "100"),
            ("difficulty", "extreme"),
            ("minDuration", "long"),
        ])
        .into_filter()
        .unwrap_err();

        let AppError::Validation(problems) = err else {
            panic!("expected validation error");
        };
        assert_eq!(problems.len(), 3, "{problems:?}");
    }
}

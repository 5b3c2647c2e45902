// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application routes. All of them require authentication.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::{parse_id, ApiResponse, MessageResponse};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::application::ApplyInput;
use crate::models::{Application, ApplicationDetails};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/applications", post(apply))
        .route("/api/applications/my", get(list_mine))
        .route("/api/applications/to-my-trips", get(list_to_my_trips))
        .route("/api/applications/check/{trip_id}", get(check_existing))
        .route("/api/applications/{id}/accept", put(accept))
        .route("/api/applications/{id}/reject", put(reject))
        .route("/api/applications/{id}", delete(withdraw))
}

/// Response for the check endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub success: bool,
    pub has_applied: bool,
    pub data: Option<Application>,
}

async fn apply(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ApplyInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Application>>)> {
    let Json(input) = payload?;
    let trip_id = parse_id(&input.trip_id)?;
    let application = state
        .applications
        .apply(user.id, trip_id, input.message)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(application, "Application submitted"),
    ))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ApplicationDetails>>> {
    let details = state.applications.accept(parse_id(&id)?, user.id).await?;
    Ok(ApiResponse::with_message(details, "Application accepted"))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ApplicationDetails>>> {
    let details = state.applications.reject(parse_id(&id)?, user.id).await?;
    Ok(ApiResponse::with_message(details, "Application rejected"))
}

async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.applications.withdraw(parse_id(&id)?, user.id).await?;
    Ok(MessageResponse::new("Application withdrawn"))
}

async fn list_mine(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<ApplicationDetails>>>> {
    let applications = state.applications.list_mine(user.id).await?;
    Ok(ApiResponse::list(applications))
}

async fn list_to_my_trips(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<ApplicationDetails>>>> {
    let applications = state.applications.list_for_organizer(user.id).await?;
    Ok(ApiResponse::list(applications))
}

async fn check_existing(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
) -> Result<Json<CheckResponse>> {
    let application = state
        .applications
        .check_existing(user.id, parse_id(&trip_id)?)
        .await?;

    Ok(Json(CheckResponse {
        success: true,
        has_applied: application.is_some(),
        data: application,
    }))
}

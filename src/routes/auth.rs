// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::MessageResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::LoginInput;
use crate::models::{ProfileUpdate, RegisterInput, User, UserProfile};
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
}

/// Routes behind the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/update-profile", put(update_profile))
}

/// Response for register and login.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub success: bool,
    pub access_token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// Body of refresh and logout.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

async fn session_for(state: &AppState, user: &User) -> Result<SessionResponse> {
    let tokens = state.sessions.issue_pair(user.id).await?;
    Ok(SessionResponse {
        success: true,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: UserProfile::from(user),
    })
}

/// Register and sign in.
async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let Json(input) = payload?;
    let user = state.credentials.create(input).await?;

    Ok((StatusCode::CREATED, Json(session_for(&state, &user).await?)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let Json(input) = payload?;
    let mut missing = Vec::new();
    if input.email.trim().is_empty() {
        missing.push("email: is required".to_string());
    }
    if input.password.is_empty() {
        missing.push("password: is required".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(missing));
    }

    let user = state
        .credentials
        .verify(&input.email, &input.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(session_for(&state, &user).await?))
}

/// Exchange a refresh token for a new access token.
async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>> {
    // An absent body is the same as an absent token.
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let access_token = state
        .sessions
        .refresh(body.refresh_token.as_deref())
        .await?;

    Ok(Json(AccessTokenResponse {
        success: true,
        access_token,
    }))
}

/// Revoke a refresh token. Revoking an unknown token succeeds.
async fn logout(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let body = payload.map(|Json(b)| b).unwrap_or_default();
    let token = body
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AppError::MissingToken)?;

    state.sessions.revoke(&token).await?;
    Ok(MessageResponse::new("Logged out"))
}

async fn me(Extension(user): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user: user.profile,
    })
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let Json(update) = payload?;
    let updated = state.credentials.update_profile(user.id, update).await?;

    Ok(Json(UserResponse {
        success: true,
        user: UserProfile::from(&updated),
    }))
}

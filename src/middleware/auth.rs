// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware.

use crate::error::{AppError, AuthFailure};
use crate::models::UserProfile;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user resolved from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub profile: UserProfile,
}

/// Middleware that requires a valid access token in `Authorization: Bearer`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized(AuthFailure::Missing))?;

    let user_id = state
        .sessions
        .decode_access(token)
        .map_err(AppError::Unauthorized)?;

    let user = state
        .credentials
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthorized(AuthFailure::UserNotFound))?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        profile: UserProfile::from(&user),
    });

    Ok(next.run(request).await)
}

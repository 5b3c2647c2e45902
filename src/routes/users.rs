// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public user-related reference data.

use axum::{routing::get, Json, Router};
use std::sync::Arc;

use super::ApiResponse;
use crate::models::skills::{SkillCategory, SKILL_CATALOG};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/skills", get(skills))
}

/// Suggested skills, grouped by category.
async fn skills() -> Json<ApiResponse<&'static [SkillCategory]>> {
    ApiResponse::new(SKILL_CATALOG)
}

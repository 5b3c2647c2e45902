// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use travel_planner::config::Config;
use travel_planner::db::{FirestoreDb, MemoryDb};
use travel_planner::routes::create_router;
use travel_planner::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(MemoryDb::default()),
    ));
    (create_router(state.clone()), state)
}

/// Send one request and return status plus parsed JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// A complete, valid registration body.
#[allow(dead_code)]
pub fn registration(email: &str) -> Value {
    json!({
        "email": email,
        "password": "secret123",
        "firstName": "Anna",
        "lastName": "Petrova",
        "phone": "+79991234567",
        "skills": ["driver", "first_aid", "cooking"],
        "mainSkills": ["driver"],
    })
}

/// Registered user's id and tokens.
#[allow(dead_code)]
pub struct TestUser {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Register `email` and return its session.
#[allow(dead_code)]
pub async fn register(app: &Router, email: &str) -> TestUser {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration(email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    TestUser {
        id: body["user"]["id"].as_str().unwrap().to_string(),
        access_token: body["accessToken"].as_str().unwrap().to_string(),
        refresh_token: body["refreshToken"].as_str().unwrap().to_string(),
    }
}

/// A valid trip body. Dates are in the future so the trip stays in planning.
#[allow(dead_code)]
pub fn trip_body(title: &str, max_participants: u32) -> Value {
    json!({
        "title": title,
        "destination": "Altai",
        "description": "Two weeks of hiking along the Katun river",
        "startDate": "2099-07-01T00:00:00Z",
        "endDate": "2099-07-14T00:00:00Z",
        "price": 45000.0,
        "maxParticipants": max_participants,
        "difficulty": "medium",
    })
}

/// Create a trip as `organizer` and return its id.
#[allow(dead_code)]
pub async fn create_trip(app: &Router, organizer: &TestUser, max_participants: u32) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/trips",
        Some(&organizer.access_token),
        Some(trip_body("Altai trek", max_participants)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Apply to `trip_id` as `user` and return the application id.
#[allow(dead_code)]
pub async fn apply(app: &Router, user: &TestUser, trip_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/applications",
        Some(&user.access_token),
        Some(json!({ "tripId": trip_id, "message": "I can drive" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

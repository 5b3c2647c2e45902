// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Travel planner backend.
//!
//! Users register, publish trips, browse and filter other people's trips and
//! apply to join them; organizers accept or reject applications within the
//! trip's capacity.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::Store;
use services::{ApplicationWorkflow, CredentialStore, SessionIssuer, TripRegistry};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub credentials: CredentialStore,
    pub sessions: SessionIssuer,
    pub trips: TripRegistry,
    pub applications: ApplicationWorkflow,
}

impl AppState {
    /// Wire every service to `db`.
    pub fn new(config: Config, db: Arc<dyn Store>) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone(), config.bcrypt_cost),
            sessions: SessionIssuer::new(db.clone(), config.session.clone()),
            trips: TripRegistry::new(db.clone()),
            applications: ApplicationWorkflow::new(db.clone()),
            db,
            config,
        }
    }
}

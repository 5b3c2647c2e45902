// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod applications;
pub mod credentials;
pub mod sessions;
pub mod trips;

pub use applications::ApplicationWorkflow;
pub use credentials::CredentialStore;
pub use sessions::{SessionIssuer, TokenPair};
pub use trips::TripRegistry;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod application;
pub mod session;
pub mod skills;
pub mod trip;
pub mod user;

pub use application::{
    Application, ApplicationDetails, ApplicationStatus, ApplicantSummary, TripApplications,
    TripSummary,
};
pub use session::RefreshTokenRecord;
pub use trip::{Difficulty, Trip, TripDetails, TripFilter, TripInput, TripStatus, TripView};
pub use user::{ParticipantSummary, ProfileUpdate, RegisterInput, User, UserProfile};

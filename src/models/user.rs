// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

use crate::error::{field_messages, AppError};

pub const MAX_MAIN_SKILLS: usize = 3;
pub const MIN_PASSWORD_LEN: u64 = 6;
pub const MAX_NAME_LEN: u64 = 50;
pub const MAX_ABOUT_LEN: u64 = 500;

/// User record stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID (also used as document ID)
    pub id: Uuid,
    /// Lowercased, trimmed email address
    pub email: String,
    /// bcrypt hash; never serialized into API responses
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Highlighted subset of `skills`, at most three
    #[serde(default)]
    pub main_skills: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    pub about_me: Option<String>,
    #[serde(default)]
    pub trips_as_organizer: u32,
    #[serde(default)]
    pub trips_as_participant: u32,
    #[serde(default)]
    pub organized_trips: Vec<Uuid>,
    #[serde(default)]
    pub joined_trips: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Record a newly organized trip.
    pub fn add_organized_trip(&mut self, trip_id: Uuid) {
        if !self.organized_trips.contains(&trip_id) {
            self.organized_trips.push(trip_id);
        }
        self.trips_as_organizer += 1;
    }

    /// Undo [`User::add_organized_trip`] when a trip is deleted.
    pub fn remove_organized_trip(&mut self, trip_id: Uuid) {
        self.organized_trips.retain(|id| *id != trip_id);
        self.trips_as_organizer = self.trips_as_organizer.saturating_sub(1);
    }

    /// Record an accepted application.
    pub fn add_joined_trip(&mut self, trip_id: Uuid) {
        if !self.joined_trips.contains(&trip_id) {
            self.joined_trips.push(trip_id);
        }
        self.trips_as_participant += 1;
    }
}

/// User as exposed through the API (no password hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub main_skills: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub about_me: Option<String>,
    pub trips_as_organizer: u32,
    pub trips_as_participant: u32,
    pub organized_trips: Vec<Uuid>,
    pub joined_trips: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            skills: user.skills.clone(),
            main_skills: user.main_skills.clone(),
            allergies: user.allergies.clone(),
            medical_conditions: user.medical_conditions.clone(),
            dietary_restrictions: user.dietary_restrictions.clone(),
            about_me: user.about_me.clone(),
            trips_as_organizer: user.trips_as_organizer,
            trips_as_participant: user.trips_as_participant,
            organized_trips: user.organized_trips.clone(),
            joined_trips: user.joined_trips.clone(),
            created_at: user.created_at,
        }
    }
}

/// Public subset shown in a trip's participant list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub skills: Vec<String>,
    pub main_skills: Vec<String>,
    pub about_me: Option<String>,
    pub trips_as_organizer: u32,
    pub trips_as_participant: u32,
}

impl From<&User> for ParticipantSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            skills: user.skills.clone(),
            main_skills: user.main_skills.clone(),
            about_me: user.about_me.clone(),
            trips_as_organizer: user.trips_as_organizer,
            trips_as_participant: user.trips_as_participant,
        }
    }
}

/// Registration request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(
        required(message = "is required"),
        email(message = "must be a valid email")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = MIN_PASSWORD_LEN, message = "must be at least 6 characters")
    )]
    pub password: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 1, max = MAX_NAME_LEN, message = "must be 1-50 characters")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "is required"),
        length(min = 1, max = MAX_NAME_LEN, message = "must be 1-50 characters")
    )]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub main_skills: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[validate(length(max = MAX_ABOUT_LEN, message = "must be at most 500 characters"))]
    pub about_me: Option<String>,
}

/// Registration fields that passed validation. The password is still plain text.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub main_skills: Vec<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub about_me: Option<String>,
}

impl NewUser {
    pub fn into_user(self, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            skills: self.skills,
            main_skills: self.main_skills,
            allergies: self.allergies,
            medical_conditions: self.medical_conditions,
            dietary_restrictions: self.dietary_restrictions,
            about_me: self.about_me,
            trips_as_organizer: 0,
            trips_as_participant: 0,
            organized_trips: Vec::new(),
            joined_trips: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl RegisterInput {
    /// Normalize and validate every field, collecting all problems.
    pub fn into_new_user(mut self) -> Result<NewUser, AppError> {
        self.email = self.email.map(|e| normalize_email(&e));
        trim_opt(&mut self.first_name);
        trim_opt(&mut self.last_name);
        trim_opt(&mut self.phone);
        self.phone = self.phone.filter(|p| !p.is_empty());
        trim_list(&mut self.skills);
        trim_list(&mut self.main_skills);
        trim_list(&mut self.allergies);
        trim_list(&mut self.medical_conditions);
        trim_list(&mut self.dietary_restrictions);

        let mut problems = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => field_messages(&errors),
        };
        problems.extend(profile_problems(
            self.phone.as_deref(),
            &self.skills,
            &self.main_skills,
        ));
        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }

        match self {
            RegisterInput {
                email: Some(email),
                password: Some(password),
                first_name: Some(first_name),
                last_name: Some(last_name),
                phone,
                skills,
                main_skills,
                allergies,
                medical_conditions,
                dietary_restrictions,
                about_me,
            } => Ok(NewUser {
                email,
                password,
                first_name,
                last_name,
                phone,
                skills,
                main_skills,
                allergies,
                medical_conditions,
                dietary_restrictions,
                about_me,
            }),
            _ => Err(AppError::Validation(vec![
                "user: required fields are missing".to_string()
            ])),
        }
    }
}

/// Login request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = MIN_PASSWORD_LEN, message = "must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = MAX_NAME_LEN, message = "must be 1-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = MAX_NAME_LEN, message = "must be 1-50 characters"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub main_skills: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub dietary_restrictions: Option<Vec<String>>,
    #[validate(length(max = MAX_ABOUT_LEN, message = "must be at most 500 characters"))]
    pub about_me: Option<String>,
}

impl ProfileUpdate {
    /// Merge into `user`, validating the merged result.
    ///
    /// Returns the new plain-text password if one was supplied; the caller
    /// must hash it before persisting.
    pub fn apply(
        mut self,
        user: &mut User,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        trim_opt(&mut self.first_name);
        trim_opt(&mut self.last_name);
        trim_opt(&mut self.phone);
        for list in [
            &mut self.skills,
            &mut self.main_skills,
            &mut self.allergies,
            &mut self.medical_conditions,
            &mut self.dietary_restrictions,
        ]
        .into_iter()
        .flatten()
        {
            trim_list(list);
        }

        if let Err(errors) = self.validate() {
            return Err(AppError::Validation(field_messages(&errors)));
        }

        let mut merged = user.clone();
        if let Some(v) = self.first_name {
            merged.first_name = v;
        }
        if let Some(v) = self.last_name {
            merged.last_name = v;
        }
        if let Some(v) = self.phone {
            // An empty phone clears it.
            merged.phone = Some(v).filter(|p| !p.is_empty());
        }
        if let Some(v) = self.skills {
            merged.skills = v;
        }
        if let Some(v) = self.main_skills {
            merged.main_skills = v;
        }
        if let Some(v) = self.allergies {
            merged.allergies = v;
        }
        if let Some(v) = self.medical_conditions {
            merged.medical_conditions = v;
        }
        if let Some(v) = self.dietary_restrictions {
            merged.dietary_restrictions = v;
        }
        if let Some(v) = self.about_me {
            merged.about_me = Some(v);
        }

        let problems = profile_problems(
            merged.phone.as_deref(),
            &merged.skills,
            &merged.main_skills,
        );
        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }

        merged.updated_at = now;
        *user = merged;
        Ok(self.password)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Cross-field profile rules that `validator` attributes cannot express.
fn profile_problems(phone: Option<&str>, skills: &[String], main_skills: &[String]) -> Vec<String> {
    let mut problems = Vec::new();
    if let Some(phone) = phone {
        if !is_valid_phone(phone) {
            problems.push("phone: must be +7 or 8 followed by 10 digits".to_string());
        }
    }
    if main_skills.len() > MAX_MAIN_SKILLS {
        problems.push("mainSkills: at most 3 main skills".to_string());
    }
    if !main_skills.iter().all(|s| skills.contains(s)) {
        problems.push("mainSkills: must be chosen from skills".to_string());
    }
    problems
}

/// `+7XXXXXXXXXX` or `8XXXXXXXXXX`.
fn is_valid_phone(phone: &str) -> bool {
    let rest = phone
        .strip_prefix("+7")
        .or_else(|| phone.strip_prefix('8'));
    matches!(rest, Some(digits) if digits.len() == 10 && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value {
        *v = v.trim().to_string();
    }
}

fn trim_list(list: &mut Vec<String>) {
    for item in list.iter_mut() {
        *item = item.trim().to_string();
    }
    list.retain(|item| !item.is_empty());
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User accounts and password verification.
//!
//! Passwords are stored only as bcrypt hashes. Hashing and verification are
//! CPU-bound, so both run on the blocking thread pool.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::AppError;
use crate::models::user::{normalize_email, ProfileUpdate, RegisterInput, User};

pub struct CredentialStore {
    db: Arc<dyn Store>,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(db: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Register a new user. All field problems are reported together.
    pub async fn create(&self, input: RegisterInput) -> Result<User, AppError> {
        let new_user = input.into_new_user()?;

        // Cheap pre-check so a taken email doesn't cost a hash. The store
        // enforces uniqueness again on insert.
        if self.db.find_user_by_email(&new_user.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let hash = self.hash(new_user.password.clone()).await?;
        let user = new_user.into_user(hash, Utc::now());
        self.db.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Return the user if `password` matches; `None` for an unknown email or
    /// a wrong password alike.
    pub async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Ok(None);
        }
        let Some(user) = self.db.find_user_by_email(&email).await? else {
            return Ok(None);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(matches.then_some(user))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.db.get_user(id).await
    }

    /// Apply a partial profile update. The email is not editable here.
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User, AppError> {
        let mut user = self
            .db
            .get_user(id)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        if let Some(password) = update.apply(&mut user, Utc::now())? {
            user.password_hash = self.hash(password).await?;
        }
        self.db.update_user_profile(&user).await?;

        tracing::info!(user_id = %id, "Profile updated");
        Ok(user)
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryDb::new()), 4)
    }

    fn input(email: &str) -> RegisterInput {
        RegisterInput {
            email: Some(email.to_string()),
            password: Some("secret1".to_string()),
            first_name: Some("Olga".to_string()),
            last_name: Some("Smirnova".to_string()),
            ..RegisterInput::default()
        }
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let store = store();
        let user = store.create(input("olga@example.com")).await.unwrap();

        assert_ne!(user.password_hash, "secret1");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_duplicate_email_any_case() {
        let store = store();
        store.create(input("olga@example.com")).await.unwrap();

        let err = store.create(input("  OLGA@Example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn test_verify() {
        let store = store();
        let user = store.create(input("olga@example.com")).await.unwrap();

        let found = store.verify("Olga@Example.com", "secret1").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        assert!(store
            .verify("olga@example.com", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .verify("nobody@example.com", "secret1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_profile_rehashes_password() {
        let store = store();
        let user = store.create(input("olga@example.com")).await.unwrap();

        let update = ProfileUpdate {
            password: Some("another-secret".to_string()),
            last_name: Some("Ivanova".to_string()),
            ..ProfileUpdate::default()
        };
        let updated = store.update_profile(user.id, update).await.unwrap();

        assert_eq!(updated.last_name, "Ivanova");
        assert_eq!(updated.first_name, "Olga");
        assert!(store
            .verify("olga@example.com", "another-secret")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .verify("olga@example.com", "secret1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let store = store();
        let err = store
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("User")));
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session credentials.
//!
//! Access tokens are short-lived, stateless HS256 JWTs. Refresh tokens are
//! longer-lived JWTs signed with a separate key; each one is also persisted
//! (by digest) so it can be revoked, and it is only honored while that
//! record exists and is unexpired.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::db::Store;
use crate::error::{AppError, AuthFailure};
use crate::models::session::{token_digest, RefreshTokenRecord};

/// Access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Refresh token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct RefreshClaims {
    sub: String,
    exp: i64,
    iat: i64,
    /// Makes every refresh token distinct, even within one second
    jti: String,
}

/// Tokens handed out on register and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionIssuer {
    db: Arc<dyn Store>,
    config: SessionConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl SessionIssuer {
    pub fn new(db: Arc<dyn Store>, config: SessionConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(&config.access_secret),
            access_decoding: DecodingKey::from_secret(&config.access_secret),
            refresh_encoding: EncodingKey::from_secret(&config.refresh_secret),
            refresh_decoding: DecodingKey::from_secret(&config.refresh_secret),
            db,
            config,
        }
    }

    /// Mint an access token for `user_id`.
    pub fn issue_access(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.access_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Mint and persist a refresh token for `user_id`.
    pub async fn issue_refresh(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.config.refresh_ttl;
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(e.into()))?;

        let record = RefreshTokenRecord {
            user_id,
            expires_at,
            created_at: now,
        };
        self.db
            .put_refresh_token(&token_digest(&token), &record)
            .await?;

        Ok(token)
    }

    pub async fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id)?,
            refresh_token: self.issue_refresh(user_id).await?,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, token: Option<&str>) -> Result<String, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MissingToken)?;

        let user_id = self.decode_refresh(token)?;
        let digest = token_digest(token);

        let record = self
            .db
            .get_refresh_token(&digest)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or(AppError::TokenNotFound)?;

        if record.is_expired(Utc::now()) {
            self.db.delete_refresh_token(&digest).await?;
            tracing::debug!(user_id = %user_id, "Purged expired refresh token");
            return Err(AppError::TokenExpired);
        }

        self.issue_access(user_id)
    }

    /// Delete the stored record for `token`. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        self.db.delete_refresh_token(&token_digest(token.trim())).await
    }

    /// Verify an access token and return its subject.
    pub fn decode_access(&self, token: &str) -> Result<Uuid, AuthFailure> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.access_decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthFailure::Expired,
                _ => AuthFailure::Invalid,
            }
        })?;

        data.claims.sub.parse().map_err(|_| AuthFailure::Invalid)
    }

    /// Verify signature and shape only; expiry is judged by the stored record.
    fn decode_refresh(&self, token: &str) -> Result<Uuid, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation)
            .map_err(|_| AppError::InvalidToken)?;

        data.claims.sub.parse().map_err(|_| AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::MemoryDb;
    use chrono::Duration;

    fn issuer_with(config: SessionConfig) -> (SessionIssuer, Arc<MemoryDb>) {
        let db = Arc::new(MemoryDb::new());
        (SessionIssuer::new(db.clone(), config), db)
    }

    fn issuer() -> (SessionIssuer, Arc<MemoryDb>) {
        issuer_with(Config::test_default().session)
    }

    #[test]
    fn test_access_round_trip() {
        let (issuer, _) = issuer();
        let user_id = Uuid::new_v4();

        let token = issuer.issue_access(user_id).unwrap();
        assert_eq!(issuer.decode_access(&token), Ok(user_id));
    }

    #[test]
    fn test_expired_access_token() {
        let mut config = Config::test_default().session;
        config.access_ttl = Duration::seconds(-10);
        let (issuer, _) = issuer_with(config);

        let token = issuer.issue_access(Uuid::new_v4()).unwrap();
        assert_eq!(issuer.decode_access(&token), Err(AuthFailure::Expired));
    }

    #[test]
    fn test_tampered_or_foreign_access_token() {
        let (issuer, _) = issuer();
        let token = issuer.issue_access(Uuid::new_v4()).unwrap();

        assert_eq!(
            issuer.decode_access(&format!("{}x", token)),
            Err(AuthFailure::Invalid)
        );
        assert_eq!(issuer.decode_access("garbage"), Err(AuthFailure::Invalid));
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let (issuer, _) = issuer();
        let refresh = issuer.issue_refresh(Uuid::new_v4()).await.unwrap();

        assert_eq!(issuer.decode_access(&refresh), Err(AuthFailure::Invalid));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_for_same_user() {
        let (issuer, _) = issuer();
        let user_id = Uuid::new_v4();
        let refresh = issuer.issue_refresh(user_id).await.unwrap();

        let access = issuer.refresh(Some(&refresh)).await.unwrap();
        assert_eq!(issuer.decode_access(&access), Ok(user_id));
    }

    #[tokio::test]
    async fn test_refresh_errors() {
        let (issuer, _) = issuer();

        assert!(matches!(
            issuer.refresh(None).await,
            Err(AppError::MissingToken)
        ));
        assert!(matches!(
            issuer.refresh(Some("  ")).await,
            Err(AppError::MissingToken)
        ));
        assert!(matches!(
            issuer.refresh(Some("not.a.jwt")).await,
            Err(AppError::InvalidToken)
        ));

        // Access tokens are signed with the other key.
        let access = issuer.issue_access(Uuid::new_v4()).unwrap();
        assert!(matches!(
            issuer.refresh(Some(&access)).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_not_found() {
        let (issuer, _) = issuer();
        let refresh = issuer.issue_refresh(Uuid::new_v4()).await.unwrap();

        issuer.revoke(&refresh).await.unwrap();
        // Revoking twice is fine.
        issuer.revoke(&refresh).await.unwrap();

        assert!(matches!(
            issuer.refresh(Some(&refresh)).await,
            Err(AppError::TokenNotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh_token_is_purged() {
        let mut config = Config::test_default().session;
        config.refresh_ttl = Duration::seconds(-1);
        let (issuer, db) = issuer_with(config);
        let refresh = issuer.issue_refresh(Uuid::new_v4()).await.unwrap();

        assert!(matches!(
            issuer.refresh(Some(&refresh)).await,
            Err(AppError::TokenExpired)
        ));
        assert!(db
            .get_refresh_token(&token_digest(&refresh))
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            issuer.refresh(Some(&refresh)).await,
            Err(AppError::TokenNotFound)
        ));
    }
}

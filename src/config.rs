// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Signing secrets live here and are handed to the session issuer explicitly
//! through [`SessionConfig`].

use chrono::Duration;
use std::env;
use std::str::FromStr;

const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
const DEFAULT_BCRYPT_COST: u32 = 10;

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND")),
        }
    }
}

/// Signing material and lifetimes for session credentials.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HS256 key for access tokens
    pub access_secret: Vec<u8>,
    /// HS256 key for refresh tokens (must differ from the access key)
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime
    pub access_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_ttl: Duration,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    pub storage: StorageBackend,
    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,
    pub session: SessionConfig,
}

impl Config {
    /// Config for tests: in-memory storage and a cheap bcrypt cost.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 3001,
            storage: StorageBackend::Memory,
            // bcrypt's minimum cost
            bcrypt_cost: 4,
            session: SessionConfig {
                access_secret: b"test_access_key_32_bytes_minimum!".to_vec(),
                refresh_secret: b"test_refresh_key_32_bytes_minimum".to_vec(),
                access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
                refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            },
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let access_secret = required("JWT_ACCESS_SECRET")?.into_bytes();
        let refresh_secret = required("JWT_REFRESH_SECRET")?.into_bytes();
        if access_secret == refresh_secret {
            return Err(ConfigError::Invalid("JWT_REFRESH_SECRET"));
        }

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StorageBackend::Firestore,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: parse_or("PORT", 3001)?,
            storage,
            bcrypt_cost: parse_or("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            session: SessionConfig {
                access_secret,
                refresh_secret,
                access_ttl: Duration::minutes(parse_or(
                    "ACCESS_TOKEN_TTL_MINUTES",
                    DEFAULT_ACCESS_TTL_MINUTES,
                )?),
                refresh_ttl: Duration::days(parse_or(
                    "REFRESH_TOKEN_TTL_DAYS",
                    DEFAULT_REFRESH_TTL_DAYS,
                )?),
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

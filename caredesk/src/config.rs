//! Service configuration read from the environment.

use std::path::PathBuf;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::auth::JwtConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://caredesk.db";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 12;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable must be set")]
    MissingSecret,

    #[error("unsupported JWT_ALGORITHM `{0}` (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("DATABASE_URL must be `sqlite://<path>` or `sqlite::memory:`, got `{0}`")]
    UnsupportedDatabase(String),

    #[error("TOKEN_TTL_HOURS must be an integer between 1 and 8784, got `{0}`")]
    InvalidTokenTtl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

impl DatabaseLocation {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        if url == "sqlite::memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        match url.strip_prefix("sqlite://") {
            Some(path) if !path.is_empty() => Ok(DatabaseLocation::File(PathBuf::from(path))),
            _ => Err(ConfigError::UnsupportedDatabase(url.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub database: DatabaseLocation,
    pub jwt: JwtConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let database = DatabaseLocation::parse(
            &std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
        )?;
        Ok(Self {
            bind_addr,
            database,
            jwt: jwt_from_env()?,
        })
    }
}

/// Read `JWT_SECRET`, `JWT_ALGORITHM` and `TOKEN_TTL_HOURS`.
pub fn jwt_from_env() -> Result<JwtConfig, ConfigError> {
    let secret = std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingSecret)?;

    let algorithm = match std::env::var("JWT_ALGORITHM") {
        Ok(raw) => parse_algorithm(&raw)?,
        Err(_) => Algorithm::HS256,
    };

    let ttl_hours = match std::env::var("TOKEN_TTL_HOURS") {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
            .ok_or(ConfigError::InvalidTokenTtl(raw))?,
        Err(_) => DEFAULT_TOKEN_TTL_HOURS,
    };

    Ok(JwtConfig::new(secret, algorithm).with_ttl_hours(ttl_hours))
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
    }
}

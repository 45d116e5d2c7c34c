use anyhow::{Context, Result};
use std::{env, fmt::Display, str::FromStr};
use tracing::{info, warn};

/// What the read side does with an interview request whose requester
/// (user or job-seeker profile) cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMissPolicy {
    /// Leave the record out and log it.
    Drop,
    /// Keep the record with "Unknown User" placeholders.
    Placeholder,
    /// Fail the whole read.
    Error,
}

impl FromStr for JoinMissPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(JoinMissPolicy::Drop),
            "placeholder" => Ok(JoinMissPolicy::Placeholder),
            "error" => Ok(JoinMissPolicy::Error),
            other => Err(format!(
                "unknown join-miss policy '{}', expected drop, placeholder or error",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub cors_allowed_origin: String,
    pub port: u16,
    pub admin_signup_code: Option<String>,
    pub join_miss_policy: JoinMissPolicy,
    pub max_request_body_kb: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            jwt_expiration_hours: parse_or("JWT_EXPIRATION_HOURS", 24)?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_allowed_origin: optional("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            port: parse_or("PORT", 8000)?,
            admin_signup_code: optional("ADMIN_SIGNUP_CODE"),
            join_miss_policy: parse_or("JOIN_MISS_POLICY", JoinMissPolicy::Drop)?,
            max_request_body_kb: parse_or("MAX_REQUEST_BODY_KB", 256)?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match optional(key) {
        Some(raw) => raw.parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow::anyhow!("invalid value for {}: {}", key, e)
        }),
        None => {
            info!("{key} not set, using default: {default:?}");
            Ok(default)
        }
    }
}

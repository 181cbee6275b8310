use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;
use std::time::Duration;

use crate::error::AppError;

/// Cheapest bcrypt cost the hasher accepts.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Signing secret used when `JWT_SECRET` is not set. Tokens signed with it can
/// be forged by anyone who has read this source; never deploy with it.
pub const INSECURE_FALLBACK_SECRET: &str = "insecure-development-secret-change-me";

pub struct Config {
    pub database: PgConnectOptions,
    pub database_max_connections: u32,
    pub database_connect_timeout: Duration,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_secret_is_fallback: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database = match get("DATABASE_URL") {
            Some(url) => url.parse::<PgConnectOptions>().map_err(|e| {
                AppError::InternalServerError(format!("DATABASE_URL is invalid: {}", e))
            })?,
            None => {
                // Set field by field so credentials need no URL escaping.
                let ssl_mode = or("DB_SSLMODE", "disable")
                    .parse::<PgSslMode>()
                    .map_err(|e| {
                        AppError::InternalServerError(format!("DB_SSLMODE is invalid: {}", e))
                    })?;
                let options = PgConnectOptions::new()
                    .host(&or("DB_HOST", "localhost"))
                    .port(parse(&get, "DB_PORT", 5432)?)
                    .username(&or("DB_USER", "postgres"))
                    .database(&or("DB_NAME", "tasktracker"))
                    .ssl_mode(ssl_mode);
                match get("DB_PASSWORD") {
                    Some(password) => options.password(&password),
                    None => options,
                }
            }
        };

        let (jwt_secret, jwt_secret_is_fallback) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (INSECURE_FALLBACK_SECRET.to_string(), true),
        };

        let port_key = if get("SERVER_PORT").is_some() {
            "SERVER_PORT"
        } else {
            "PORT"
        };

        let bcrypt_cost = parse(&get, "BCRYPT_COST", 10u32)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(AppError::InternalServerError(format!(
                "BCRYPT_COST must be between {} and {}, got {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST, bcrypt_cost
            )));
        }

        Ok(Self {
            database,
            database_max_connections: parse(&get, "DB_MAX_CONNECTIONS", 5)?,
            database_connect_timeout: Duration::from_secs(parse(
                &get,
                "DB_CONNECT_TIMEOUT_SECS",
                5,
            )?),
            server_port: parse(&get, port_key, 8080)?,
            server_host: or("SERVER_HOST", "127.0.0.1"),
            jwt_secret,
            jwt_secret_is_fallback,
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} must be a number", key))),
        None => Ok(default),
    }
}

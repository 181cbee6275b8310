use actix_web::http::header::HeaderValue;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;
use crate::models::User;

/// How long a session token stays valid after login.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Session claims carried inside a signed token. Nothing is stored server-side.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: u64,
    pub username: String,
    pub email: String,
    /// Issued-at, seconds since epoch.
    pub iat: usize,
    /// Expiration, seconds since epoch.
    pub exp: usize,
}

impl Claims {
    /// Claims for `user` issued at `now`, expiring `SESSION_LIFETIME_HOURS` later.
    pub fn for_user(user: &User, now: DateTime<Utc>) -> Self {
        let expires = now + Duration::hours(SESSION_LIFETIME_HOURS);
        Self {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp().max(0) as usize,
            exp: expires.timestamp().max(0) as usize,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Why a bearer token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    MissingToken,
    MalformedToken,
    InvalidSignature,
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            TokenError::MissingToken => "Missing bearer token",
            TokenError::MalformedToken => "Malformed token",
            TokenError::InvalidSignature => "Invalid token signature",
            TokenError::Expired => "Token has expired",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for TokenError {}

/// Signs `claims` with HS256 under `secret`.
pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies the signature and expiry of `token` and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::MalformedToken,
    })
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, TokenError> {
    let value = header
        .and_then(|value| value.to_str().ok())
        .ok_or(TokenError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(TokenError::MissingToken)?
        .trim();
    if token.is_empty() {
        return Err(TokenError::MissingToken);
    }
    Ok(token)
}

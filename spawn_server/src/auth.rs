//! Access token handling.
//!
//! Users log in elsewhere and receive an HS256-signed JWT whose claims carry their user id. Every purchase endpoint
//! requires that token, either in the `x-auth-token` header or as an `Authorization: Bearer` token. Handlers simply
//! take a [`JwtClaims`] argument; the extractor rejects the request with a 401 if the token is missing or invalid.
use std::{
    future::{ready, Ready},
    time::Duration,
};

use actix_web::{dev::Payload, http::header::HeaderMap, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use spawn_engine::db_types::UserId;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user: TokenUser,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

/// Signs and validates access tokens with the shared secret.
#[derive(Clone)]
pub struct SpawnAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SpawnAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        let validation = Validation::new(Algorithm::HS256);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issues a new access token for the given user. The token is valid for a day unless `duration` says otherwise.
    pub fn issue_token(&self, user_id: UserId, duration: Option<Duration>) -> Result<String, AuthError> {
        let lifetime = duration.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let lifetime = i64::try_from(lifetime.as_secs()).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let claims = JwtClaims { user: TokenUser { id: user_id }, exp: Utc::now().timestamp() + lifetime };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }
}

/// Reads the raw token from the request headers. `x-auth-token` wins if both headers are present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let token = headers.get(AUTH_TOKEN_HEADER).and_then(|v| v.to_str().ok()).map(str::trim).filter(|s| !s.is_empty());
    token.or_else(|| {
        headers
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let authority = req.app_data::<web::Data<SpawnAuthority>>().ok_or_else(|| {
        error!("💻️ No token authority has been configured. All authenticated requests will fail.");
        ServerError::ConfigurationError("No token authority has been configured".to_string())
    })?;
    let token = token_from_headers(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = authority.validate(token).map_err(|e| {
        debug!("💻️ Rejected access token. {e}");
        e
    })?;
    trace!("💻️ Authenticated user {}", claims.user.id);
    Ok(claims)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

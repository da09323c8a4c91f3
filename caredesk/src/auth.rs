//! Bearer-token authentication.
//!
//! The token subject is a username. The middleware resolves it to an
//! [`Actor`] (user id plus profile role) and attaches it to the request, so
//! handlers never look at raw claims.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use wards::Actor;

use crate::config::{DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use crate::AppState;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub exp: usize,
    pub iat: Option<usize>,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("ttl_hours", &self.ttl_hours)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: String, algorithm: Algorithm) -> Self {
        Self {
            secret,
            algorithm,
            ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    pub fn with_ttl_hours(mut self, ttl_hours: i64) -> Self {
        self.ttl_hours = ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS);
        self
    }
}

/// Mint a token for `username`, valid for the configured lifetime.
pub fn issue_token(config: &JwtConfig, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        exp: (now + Duration::hours(config.ttl_hours)).timestamp() as usize,
        iat: Some(now.timestamp() as usize),
    };
    encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate the bearer token and attach the resolved [`Actor`].
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(message) => {
            debug!("Rejecting request without usable bearer token: {}", message);
            return unauthorized_response(message);
        }
    };

    let claims = match verify_jwt(&token, &state.jwt) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("JWT validation failed: {}", e);
            return unauthorized_response(format!("Invalid token: {}", e));
        }
    };

    match state.store.actor(&claims.sub) {
        Ok(Some(actor)) => {
            debug!(
                "Authenticated {} (user {}, role {})",
                actor.username,
                actor.user_id,
                actor.effective_role()
            );
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        Ok(None) => {
            warn!("Token subject {} has no account", claims.sub);
            unauthorized_response("Unknown user")
        }
        Err(e) => {
            error!("Failed to resolve token subject {}: {}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

fn bearer_token(request: &Request) -> Result<String, &'static str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?;
    let value = header
        .to_str()
        .map_err(|_| "Invalid Authorization header")?;
    value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or("Authorization header must use Bearer scheme")
}

fn verify_jwt(token: &str, config: &JwtConfig) -> Result<Claims, String> {
    let mut validation = Validation::new(config.algorithm);
    validation.validate_exp = true;

    let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Token decode error: {}", e))?;

    Ok(token_data.claims)
}

fn unauthorized_response(message: impl Into<String>) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}

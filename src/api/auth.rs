//! Bearer-token authentication and role gates.
//!
//! `verify_token` decodes the JWT from `Authorization: Bearer <token>` and
//! stores the [`Claims`] in the request extensions. The role gates run after
//! it, re-read the caller's user document and check the role capability.
//!
//! Tokens are only minted for a trusted issuer (the sign-in front end) that
//! presents the shared key in `X-Issuer-Key`. Without a configured key,
//! `POST /jwt` refuses every request.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::extract::JsonBody;
use super::state::AppState;
use crate::core::access::{ensure_capability, Capability};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::require_text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub const ISSUER_KEY_HEADER: &str = "x-issuer-key";

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    issuer_key: Option<String>,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl: Duration::hours(ttl_hours),
            issuer_key: None,
        }
    }

    pub fn with_issuer_key(mut self, key: Option<String>) -> Self {
        self.issuer_key = key.filter(|k| !k.is_empty());
        self
    }

    /// Checks the key presented by whoever asks for a token.
    pub fn authorize_issuer(&self, presented: Option<&str>) -> Result<()> {
        let expected = self
            .issuer_key
            .as_deref()
            .ok_or_else(|| AppError::Forbidden("token issuance is disabled".into()))?;
        let presented = presented.ok_or(AppError::MissingToken)?;

        if !constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
            return Err(AppError::Forbidden("invalid issuer key".into()));
        }
        Ok(())
    }

    pub fn issue(&self, email: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn verify_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request).ok_or(AppError::MissingToken)?;
    let claims = state.tokens.verify(token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

async fn require_capability(
    state: &AppState,
    request: Request,
    next: Next,
    capability: Capability,
) -> Result<Response> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or(AppError::MissingToken)?;

    ensure_capability(state.users.as_ref(), &claims.email, capability).await?;
    Ok(next.run(request).await)
}

pub async fn verify_moderator(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    require_capability(&state, request, next, Capability::ModerateProducts).await
}

pub async fn verify_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    require_capability(&state, request, next, Capability::ManageUsers).await
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let presented = headers
        .get(ISSUER_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    state.tokens.authorize_issuer(presented)?;

    require_text("email", &body.email)?;
    let token = state.tokens.issue(&body.email)?;
    tracing::debug!("Issued token for {}", body.email);
    Ok(Json(TokenResponse { token }))
}

/// Handlers behind `verify_token` take the caller this way.
pub type Caller = Extension<Claims>;

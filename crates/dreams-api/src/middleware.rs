use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use dreams_db::Database;
use dreams_engine::{EngineError, EngineResult, IdentityGate};
use dreams_types::api::Claims;
use dreams_types::models::UserId;

use crate::error::ApiError;

/// Raw bearer token of the current request. Verification is left to the
/// engine, which checks it first (or second, for standups) in every operation.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Pull the bearer token out of the Authorization header.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| EngineError::auth("Missing bearer token"))?;

    req.extensions_mut()
        .insert(SessionToken(bearer.token().to_string()));
    Ok(next.run(req).await)
}

/// Issues and verifies HS256 session tokens. A token is honoured only while
/// its session is still live in the store.
pub struct JwtGate {
    db: Arc<Database>,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtGate {
    pub fn new(db: Arc<Database>, secret: &str) -> Self {
        Self {
            db,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user_id: UserId, sid: Uuid, ttl: chrono::Duration) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            sid,
            exp: (chrono::Utc::now() + ttl).timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Signature and expiry check only; says nothing about the session.
    pub fn claims(&self, token: &str) -> EngineResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| EngineError::auth(format!("Invalid token: {}", e)))
    }
}

impl IdentityGate for JwtGate {
    fn authenticate(&self, token: &str) -> EngineResult<UserId> {
        let claims = self.claims(token)?;
        match self.db.session_user(&claims.sid)? {
            Some(user_id) if user_id == claims.sub => Ok(user_id),
            _ => Err(EngineError::auth("Session has ended")),
        }
    }
}

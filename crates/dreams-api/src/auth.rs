use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use dreams_db::Database;
use dreams_engine::{Engine, EngineError};
use dreams_types::api::{AuthResponse, LoginRequest, LogoutResponse, RegisterRequest};
use dreams_types::models::UserId;

use crate::error::ApiError;
use crate::middleware::{JwtGate, SessionToken};

const PASSWORD_MIN_LEN: usize = 6;
const NAME_MAX_LEN: usize = 50;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub engine: Engine,
    pub gate: Arc<JwtGate>,
    pub token_ttl: chrono::Duration,
}

impl AppStateInner {
    /// Wire the store, the JWT gate and the engine together.
    pub fn new(db: Arc<Database>, jwt_secret: &str, token_ttl: chrono::Duration) -> AppState {
        let gate = Arc::new(JwtGate::new(db.clone(), jwt_secret));
        let engine = Engine::new(db.clone(), gate.clone());
        Arc::new(Self {
            db,
            engine,
            gate,
            token_ttl,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !is_valid_email(&req.email) {
        return Err(EngineError::validation("Invalid email address").into());
    }
    if req.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(EngineError::validation("Password is too short").into());
    }
    for name in [&req.name_first, &req.name_last] {
        let len = name.chars().count();
        if len == 0 || len > NAME_MAX_LEN {
            return Err(EngineError::validation(format!(
                "Names must be 1 to {} characters",
                NAME_MAX_LEN
            ))
            .into());
        }
    }

    // Hash password with Argon2id off the async runtime
    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        EngineError::Configuration("Password hashing failed".into())
    })?
    .map_err(|e| EngineError::Configuration(format!("Password hashing failed: {}", e)))?;

    let user_id = state
        .db
        .create_user(&req.email, &password_hash, &req.name_first, &req.name_last)?
        .ok_or_else(|| EngineError::validation("Email address is already in use"))?;

    info!("Registered user {}", user_id);
    let response = start_session(&state, user_id)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| EngineError::validation("Unknown email address"))?;

    // Verify password
    let stored = user.password.clone();
    let password = req.password;
    let verified = tokio::task::spawn_blocking(move || {
        PasswordHash::new(&stored)
            .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        EngineError::Configuration("Password check failed".into())
    })?
    .map_err(|e| EngineError::Configuration(format!("Stored hash is unreadable: {}", e)))?;

    if !verified {
        return Err(EngineError::validation("Incorrect password").into());
    }

    info!("User {} logged in", user.id);
    Ok(Json(start_session(&state, user.id)?))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state.gate.claims(&token.0)?;
    let is_success = state.db.end_session(&claims.sid)?;
    if is_success {
        info!("User {} logged out", claims.sub);
    }
    Ok(Json(LogoutResponse { is_success }))
}

fn start_session(state: &AppStateInner, user_id: UserId) -> Result<AuthResponse, ApiError> {
    let sid = state.db.create_session(user_id)?;
    let token = state.gate.issue(user_id, sid, state.token_ttl)?;
    Ok(AuthResponse {
        token,
        auth_user_id: user_id,
    })
}

/// `local@domain.tld`: word characters (plus `.` in the local part) and a two
/// or three character top-level domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';

    !local.is_empty()
        && local.chars().all(|c| word(c) || c == '.')
        && !host.is_empty()
        && host.chars().all(word)
        && (2..=3).contains(&tld.len())
        && tld.chars().all(word)
}

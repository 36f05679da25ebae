use axum::{Extension, Json, extract::State, response::IntoResponse};

use dreams_types::api::NotificationsResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionToken;

pub async fn get_notifications(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state.engine.notifications_get(&token.0)?;
    Ok(Json(NotificationsResponse { notifications }))
}

/// Wipe every table and cancel pending timers. Needs no session.
pub async fn clear(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.engine.clear()?;
    Ok(Json(serde_json::json!({})))
}

use axum::{Extension, Json, extract::State, response::IntoResponse};

use dreams_types::api::{UserPermissionChangeRequest, UserRemoveRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionToken;

pub async fn change_permission(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<UserPermissionChangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .admin_userpermission_change(&token.0, req.u_id, req.permission_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn remove_user(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<UserRemoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.admin_user_remove(&token.0, req.u_id)?;
    Ok(Json(serde_json::json!({})))
}

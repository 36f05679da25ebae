use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use dreams_types::api::{DmCreateRequest, DmCreateResponse, DmInviteRequest, DmRemoveRequest};
use dreams_types::models::DmId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionToken;

#[derive(Debug, Deserialize)]
pub struct DmQuery {
    pub dm_id: DmId,
}

pub async fn create_dm(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<DmCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (dm_id, dm_name) = state.engine.dm_create(&token.0, &req.u_ids)?;
    Ok((StatusCode::CREATED, Json(DmCreateResponse { dm_id, dm_name })))
}

pub async fn invite_to_dm(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<DmInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.dm_invite(&token.0, req.dm_id, req.u_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn dm_details(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<DmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.dm_details(&token.0, query.dm_id)?))
}

pub async fn remove_dm(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<DmRemoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.dm_remove(&token.0, req.dm_id)?;
    Ok(Json(serde_json::json!({})))
}

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use dreams_types::api::{
    ChannelAddOwnerRequest, ChannelCreateRequest, ChannelCreateResponse, ChannelInviteRequest,
    ChannelJoinRequest,
};
use dreams_types::models::ChannelId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionToken;

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    pub channel_id: ChannelId,
}

pub async fn create_channel(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ChannelCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = state
        .engine
        .channels_create(&token.0, &req.name, req.is_public)?;
    Ok((StatusCode::CREATED, Json(ChannelCreateResponse { channel_id })))
}

pub async fn join_channel(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ChannelJoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.channel_join(&token.0, req.channel_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn invite_to_channel(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ChannelInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.channel_invite(&token.0, req.channel_id, req.u_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn add_owner(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ChannelAddOwnerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.channel_addowner(&token.0, req.channel_id, req.u_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn channel_details(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<ChannelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.channel_details(&token.0, query.channel_id)?))
}

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};

use dreams_types::api::{StandupSendRequest, StandupStartRequest, StandupStartResponse};

use crate::auth::AppState;
use crate::channels::ChannelQuery;
use crate::error::ApiError;
use crate::middleware::SessionToken;

pub async fn start_standup(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<StandupStartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let time_finish = state
        .engine
        .standup_start(&token.0, req.channel_id, req.length)?;
    Ok(Json(StandupStartResponse { time_finish }))
}

pub async fn standup_active(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<ChannelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.standup_active(&token.0, query.channel_id)?))
}

pub async fn standup_send(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<StandupSendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .standup_send(&token.0, req.channel_id, &req.message)?;
    Ok(Json(serde_json::json!({})))
}

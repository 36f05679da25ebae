use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use dreams_types::api::{
    EditMessageRequest, MessageIdResponse, MessageTargetRequest, ReactRequest, SendDmRequest,
    SendLaterDmRequest, SendLaterRequest, SendMessageRequest, ShareMessageRequest,
    ShareMessageResponse,
};
use dreams_types::models::{ChannelId, ConversationRef, DmId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionToken;

#[derive(Debug, Deserialize)]
pub struct ChannelMessagesQuery {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub start: i64,
}

#[derive(Debug, Deserialize)]
pub struct DmMessagesQuery {
    pub dm_id: DmId,
    #[serde(default)]
    pub start: i64,
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = state
        .engine
        .send(&token.0, ConversationRef::Channel(req.channel_id), &req.message)?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn send_dm(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<SendDmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = state
        .engine
        .send(&token.0, ConversationRef::Dm(req.dm_id), &req.message)?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn channel_messages(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<ChannelMessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .engine
        .paginate(&token.0, ConversationRef::Channel(query.channel_id), query.start)?;
    Ok(Json(page))
}

pub async fn dm_messages(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Query(query): Query<DmMessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .engine
        .paginate(&token.0, ConversationRef::Dm(query.dm_id), query.start)?;
    Ok(Json(page))
}

pub async fn edit_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<EditMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.edit(&token.0, req.message_id, &req.message)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn remove_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<MessageTargetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.remove(&token.0, req.message_id)?;
    Ok(Json(serde_json::json!({})))
}

/// The target is given as a `(channel_id, dm_id)` pair with `-1` on the unused side.
pub async fn share_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ShareMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shared_message_id = state.engine.share(
        &token.0,
        req.og_message_id,
        &req.message,
        u64::try_from(req.channel_id).ok(),
        u64::try_from(req.dm_id).ok(),
    )?;
    Ok(Json(ShareMessageResponse { shared_message_id }))
}

pub async fn pin_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<MessageTargetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.pin(&token.0, req.message_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn unpin_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<MessageTargetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.unpin(&token.0, req.message_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn react_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ReactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.react(&token.0, req.message_id, req.react_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn unreact_message(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<ReactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.unreact(&token.0, req.message_id, req.react_id)?;
    Ok(Json(serde_json::json!({})))
}

pub async fn send_later(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<SendLaterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = state.engine.send_later(
        &token.0,
        ConversationRef::Channel(req.channel_id),
        &req.message,
        req.time_sent,
    )?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn send_later_dm(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<SendLaterDmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = state.engine.send_later(
        &token.0,
        ConversationRef::Dm(req.dm_id),
        &req.message,
        req.time_sent,
    )?;
    Ok(Json(MessageIdResponse { message_id }))
}

pub async fn cancel_send_later(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<MessageTargetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.cancel_send_later(&token.0, req.message_id)?;
    Ok(Json(serde_json::json!({})))
}

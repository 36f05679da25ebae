use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{admin, channels, dms, messages, notifications, standup};

/// Every HTTP route. Logging and CORS layers are left to the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register/v2", post(auth::register))
        .route("/auth/login/v2", post(auth::login))
        .route("/clear/v1", delete(notifications::clear))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout/v1", post(auth::logout))
        // Channels
        .route("/channels/create/v2", post(channels::create_channel))
        .route("/channel/join/v2", post(channels::join_channel))
        .route("/channel/invite/v2", post(channels::invite_to_channel))
        .route("/channel/addowner/v1", post(channels::add_owner))
        .route("/channel/details/v2", get(channels::channel_details))
        .route("/channel/messages/v2", get(messages::channel_messages))
        // DMs
        .route("/dm/create/v1", post(dms::create_dm))
        .route("/dm/details/v1", get(dms::dm_details))
        .route("/dm/invite/v1", post(dms::invite_to_dm))
        .route("/dm/remove/v1", delete(dms::remove_dm))
        .route("/dm/messages/v1", get(messages::dm_messages))
        // Messages
        .route("/message/send/v2", post(messages::send_message))
        .route("/message/senddm/v1", post(messages::send_dm))
        .route("/message/edit/v2", put(messages::edit_message))
        .route("/message/remove/v1", delete(messages::remove_message))
        .route("/message/share/v1", post(messages::share_message))
        .route("/message/pin/v1", post(messages::pin_message))
        .route("/message/unpin/v1", post(messages::unpin_message))
        .route("/message/react/v1", post(messages::react_message))
        .route("/message/unreact/v1", post(messages::unreact_message))
        .route("/message/sendlater/v1", post(messages::send_later))
        .route("/message/sendlaterdm/v1", post(messages::send_later_dm))
        .route("/message/sendlater/cancel/v1", post(messages::cancel_send_later))
        // Standups
        .route("/standup/start/v1", post(standup::start_standup))
        .route("/standup/active/v1", get(standup::standup_active))
        .route("/standup/send/v1", post(standup::standup_send))
        .route("/notifications/get/v1", get(notifications::get_notifications))
        // Admin
        .route("/admin/userpermission/change/v1", post(admin::change_permission))
        .route("/admin/user/remove/v1", delete(admin::remove_user))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

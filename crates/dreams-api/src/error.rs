use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use dreams_engine::EngineError;
use dreams_types::api::ErrorBody;

/// An engine failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(EngineError::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, name) = match &self.0 {
            EngineError::Auth(_) => (StatusCode::FORBIDDEN, "AccessError"),
            EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "InputError"),
            EngineError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };
        debug!("Request failed: {}", self.0);

        let body = ErrorBody {
            code: status.as_u16(),
            name: name.to_string(),
            message: self.0.description().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

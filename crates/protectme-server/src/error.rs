use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use protectme_shared::protocol::ErrorBody;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unauthorized")]
    Unauthorized,

    /// Simulated delivery failure.
    #[error("Sync failed")]
    SyncFailed,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::SyncFailed => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        (status, axum::Json(ErrorBody { error: message })).into_response()
    }
}

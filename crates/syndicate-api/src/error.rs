//! Error types for the HTTP API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Jail and
//! cooldown rejections never reach this type: they are `200 OK` attempt
//! responses with `success: false`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use syndicate_core::EngineError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path identifier could not be parsed.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The request body or query was rejected.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An extractor rejected the request before the handler ran.
    #[error("rejected ({0}): {1}")]
    Rejected(StatusCode, String),

    /// The request lost a race or collides with existing data.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store is unreachable; the request may be retried.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidId(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected(status, _) => *status,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PlayerNotFound(id) => Self::NotFound(format!("player {id}")),
            EngineError::CrimeNotFound(id) => Self::NotFound(format!("crime {id}")),
            EngineError::InvalidInput(msg) => Self::BadRequest(msg),
            EngineError::DuplicatePlayer(msg) => Self::Conflict(format!("name taken: {msg}")),
            err @ EngineError::PersistenceConflict { .. } => Self::Conflict(err.to_string()),
            EngineError::PersistenceUnavailable(msg) => Self::Unavailable(msg),
            err @ (EngineError::InvalidState(_) | EngineError::Internal(_)) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let message = match self {
            Self::NotFound(msg)
            | Self::InvalidId(msg)
            | Self::BadRequest(msg)
            | Self::Rejected(_, msg)
            | Self::Conflict(msg)
            | Self::Unavailable(msg)
            | Self::Internal(msg) => msg,
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

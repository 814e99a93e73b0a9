use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("bad username or password")]
    BadCredentials,
    #[error("password hashing failed")]
    Hashing,
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
    #[error("requested object already exists")]
    AlreadyExists,
    #[error("requested object doesn't exist or the caller doesn't have access")]
    NotFound,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Sqlx(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not found".into()),
                e => {
                    error!("received internal error for user request: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong".into(),
                    )
                }
            },
            Self::Validation(ValidationError::NotFound) => (
                StatusCode::NOT_FOUND,
                ValidationError::NotFound.to_string(),
            ),
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            e @ Self::BadCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
            e @ Self::Hashing => {
                error!("{e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".into(),
                )
            }
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}

#[derive(Clone, Debug)]
pub enum SessionError {
    NoSession,
    SessionNotFound,
    SessionExpired,
    Internal,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::NoSession => (StatusCode::UNAUTHORIZED, "Unauthorized Access!"),
            Self::SessionNotFound => (StatusCode::UNAUTHORIZED, "Session cannot be found"),
            Self::SessionExpired => (StatusCode::UNAUTHORIZED, "Session has expired"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong"),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}

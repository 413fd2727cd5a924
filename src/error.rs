use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;

use crate::utils::validation::violations;

pub type Result<T> = std::result::Result<T, Error>;

pub const USER_NOT_FOUND: &str = "User not found";
pub const EMAIL_EXISTS: &str = "User with this email already exists";
pub const EMAIL_IN_USE: &str = "Email already in use by another user";
pub const INTERNAL_ERROR: &str = "Internal server error";

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(mongodb::error::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn user_not_found() -> Self {
        Error::NotFound(USER_NOT_FOUND.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Error::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "message": "Validation error",
                    "errors": violations(&errors),
                }),
            ),
            Error::Conflict(msg) | Error::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": msg }),
            ),
            Error::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "success": false, "message": "Payload too large" }),
            ),
            Error::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": msg }),
            ),
            other => {
                tracing::error!(error = ?other, "Unhandled error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": INTERNAL_ERROR }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            Error::Conflict(EMAIL_EXISTS.to_string())
        } else {
            Error::Database(err)
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

use argon2::password_hash::Error as ArError;
use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::errors::Error as JWError;
use serde_json::{Value, json};
use surrealdb::Error as SError;

use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Argon 2 Error: {0}")]
    Argon2Error(#[from] ArError),

    #[error("Json web token Error: {0}")]
    JwTError(#[from] JWError),

    #[error("SurrealDb Error: {0}")]
    SurrealError(#[from] SError),

    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Validator Error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Json Rejection Error: {0}")]
    AxumJsonRejection(#[from] JsonRejection),

    #[error("Query Rejection Error: {0}")]
    AxumQueryRejection(#[from] QueryRejection),

    #[error("Multipart Rejection Error: {0}")]
    AxumMultipartRejection(#[from] MultipartRejection),

    #[error("Multipart Error: {0}")]
    AxumMultipartError(#[from] MultipartError),

    // ! Auth
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Invalid authorization scheme")]
    InvalidScheme,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid login detail")]
    InvalidLoginDetails,

    // ! Domain
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
    #[error("already voted")]
    AlreadyVoted,
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl Error {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Error::Forbidden(message.into())
    }

    /// Stable machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingToken
            | Error::InvalidToken
            | Error::InvalidScheme
            | Error::TokenExpired
            | Error::InvalidLoginDetails => "unauthenticated",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::ValidationError(_)
            | Error::AxumJsonRejection(_)
            | Error::AxumQueryRejection(_)
            | Error::AxumMultipartRejection(_)
            | Error::AxumMultipartError(_)
            | Error::Invalid { .. }
            | Error::AlreadyVoted => "validation_failed",
            Error::Conflict(_) => "conflict",
            Error::Argon2Error(_)
            | Error::JwTError(_)
            | Error::SurrealError(_)
            | Error::IoError(_)
            | Error::InternalServerError => "server_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            "unauthenticated" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "validation_failed" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Value {
        match self {
            Error::ValidationError(errors) => validation_detail(errors),
            Error::Invalid { field, message } => json!({ field: [message] }),
            Error::AlreadyVoted => json!({ "vote": ["already voted"] }),
            Error::AxumJsonRejection(rejection) => json!(rejection.body_text()),
            Error::AxumQueryRejection(rejection) => json!(rejection.body_text()),
            Error::AxumMultipartRejection(rejection) => json!(rejection.body_text()),
            Error::AxumMultipartError(error) => json!(error.body_text()),
            Error::Argon2Error(_)
            | Error::JwTError(_)
            | Error::SurrealError(_)
            | Error::IoError(_)
            | Error::InternalServerError => json!("An unexpected error occurred."),
            other => json!(other.to_string()),
        }
    }
}

fn validation_detail(errors: &validator::ValidationErrors) -> Value {
    let mut detail = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(message) => json!(message),
                None => json!(e.code),
            })
            .collect();
        detail.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(detail)
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => error!("Internal Error: {:#?}", self),
            StatusCode::CONFLICT => warn!("Conflict: {}", self),
            _ => {}
        }
        let body = json!({
            "error": {
                "code": self.code(),
                "detail": self.detail(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_map_to_statuses() {
        assert_eq!(Error::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::forbidden("nope").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(Error::NotFound("Event").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::AlreadyVoted.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Conflict("race".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::InternalServerError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_detail_is_keyed_by_field() {
        let err = Error::invalid("ends_at", "End time must not be before start time.");
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(
            err.detail(),
            json!({ "ends_at": ["End time must not be before start time."] })
        );
    }

    #[test]
    fn test_internal_detail_does_not_leak() {
        let err = Error::IoError(std::io::Error::other("disk path /secret"));
        assert_eq!(err.detail(), json!("An unexpected error occurred."));
    }
}

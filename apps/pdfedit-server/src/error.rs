//! Error types for the pdfedit server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfedit_core::EditError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "INVALID_REQUEST",
            ServerError::Unprocessable(_) => "UNPROCESSABLE_DOCUMENT",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            ServerError::Internal(_) => "The document could not be edited.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Internal(msg) = &self {
            tracing::error!("Internal error: {}", msg);
        }

        let body = ErrorResponse {
            success: false,
            error: self.user_message(),
            code: self.code().to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<EditError> for ServerError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            EditError::Parse(_) | EditError::ImageDecode(_) | EditError::UnsupportedStructure(_) => {
                ServerError::Unprocessable(err.to_string())
            }
            EditError::Serialization(_) => ServerError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_unprocessable() {
        let err = ServerError::from(EditError::Parse("bad xref".into()));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.user_message().contains("bad xref"));
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ServerError::from(EditError::Serialization("disk full".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("disk full"));
    }
}

//! Errors surfaced by task handlers.

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::routing::Response;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-side problem, reported as 400 with a message.
    #[error("{0}")]
    Validation(&'static str),

    /// Durable write or read failed. Fatal for the process.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the process must stop after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Storage(_))
    }

    /// Render as `{ "message": ... }`. Storage details stay in the logs.
    pub fn to_response(&self) -> Response {
        let message = match self {
            ApiError::Validation(message) => *message,
            ApiError::Storage(_) => "internal storage error",
        };
        Response::json(self.status(), json!({ "message": message }))
    }
}

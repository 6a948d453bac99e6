//! Response conversion.
//!
//! Handlers produce transport-independent [`Response`] values; this module
//! renders them for axum. Bodies are JSON, empty bodies carry no content type.

use axum::response::IntoResponse;
use axum::Json;

use crate::routing::Response;

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        }
    }
}

//! Request handling.
//!
//! # Responsibilities
//! - Request ID header shared by the ID layers and handlers
//! - Decode query strings into name → value pairs
//! - Parse JSON bodies leniently
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A body that is empty or not JSON becomes `Value::Null`; handlers then
//!   report the missing fields themselves

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName};
use serde_json::Value;

/// Header carrying the per-request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID set by the request ID layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Decode a raw query string. Repeated keys keep the last value.
pub fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Parse a request body as JSON.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Request body is not JSON");
            Value::Null
        }
    }
}

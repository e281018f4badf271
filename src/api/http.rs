//! Shared HTTP client construction and error mapping.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::NarrativeError;

/// Client for request/response calls, bounded by `timeout`.
pub fn request_client(timeout: Duration) -> Result<reqwest::Client, NarrativeError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .default_headers(json_headers())
        .build()?)
}

/// Client for long-lived streams: only connecting is bounded by `connect_timeout`.
pub fn stream_client(connect_timeout: Duration) -> Result<reqwest::Client, NarrativeError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()?)
}

/// JSON request headers.
pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Map a non-success response to an API error.
///
/// Prefers the service's `detail` field, then the status reason phrase.
pub fn status_to_error(status: StatusCode, body: &str) -> NarrativeError {
    let message = extract_detail(body).unwrap_or_else(|| match status.canonical_reason() {
        Some(reason) => reason.to_string(),
        None => format!("HTTP error! status: {}", status.as_u16()),
    });
    NarrativeError::api(status.as_u16(), message)
}

fn extract_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

//! HTTP response handling shared by the REST adapters
//!
//! Status code mapping:
//!
//! - 401/403 → `PlatformError::Authentication`
//! - 429 → `PlatformError::RateLimit`
//! - 400/422 → `PlatformError::Validation`
//! - transport failures → `PlatformError::Network`
//! - anything else, including malformed bodies → `PlatformError::Posting`

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PlatformError;

/// Map a failed `send()` to a network error
pub(crate) fn transport_error(platform: &str, context: &str, error: reqwest::Error) -> PlatformError {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    PlatformError::Network(format!("{} {} {}: {}", platform, context, kind, error))
}

/// Classify a non-success status with the upstream message
pub(crate) fn status_error(platform: &str, status: StatusCode, message: &str) -> PlatformError {
    let detail = format!("{} ({}): {}", platform, status.as_u16(), message);
    match status.as_u16() {
        401 | 403 => PlatformError::Authentication(detail),
        429 => PlatformError::RateLimit(detail),
        400 | 422 => PlatformError::Validation(detail),
        _ => PlatformError::Posting(detail),
    }
}

/// Read a response body as JSON, turning every failure shape into a
/// `PlatformError`
pub(crate) async fn read_json<T: DeserializeOwned>(
    platform: &str,
    context: &str,
    response: Response,
) -> Result<T, PlatformError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(platform, context, e))?;

    parse_body(platform, context, status, &body)
}

/// Check the status of a response whose body is not needed
pub(crate) async fn ensure_success(
    platform: &str,
    context: &str,
    response: Response,
) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(
        platform,
        status,
        &format!("{} failed: {}", context, upstream_message(&body)),
    ))
}

pub(crate) fn parse_body<T: DeserializeOwned>(
    platform: &str,
    context: &str,
    status: StatusCode,
    body: &str,
) -> Result<T, PlatformError> {
    if !status.is_success() {
        return Err(status_error(
            platform,
            status,
            &format!("{} failed: {}", context, upstream_message(body)),
        ));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        PlatformError::Posting(format!(
            "{} {} returned a malformed response: {}",
            platform, context, e
        ))
    })?;

    // The Graph API can report errors inside a 200 response
    if let Some(error) = value.get("error") {
        return Err(graph_error(platform, context, error));
    }

    serde_json::from_value(value).map_err(|e| {
        PlatformError::Posting(format!(
            "{} {} returned an unexpected response: {}",
            platform, context, e
        ))
    })
}

/// Graph API error codes: 190 is an invalid or expired token, 4/17/32/613
/// are throttling
fn graph_error(platform: &str, context: &str, error: &Value) -> PlatformError {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    let detail = format!("{} {} failed: {}", platform, context, message);

    match error.get("code").and_then(Value::as_i64) {
        Some(102) | Some(190) => PlatformError::Authentication(detail),
        Some(4) | Some(17) | Some(32) | Some(613) => PlatformError::RateLimit(detail),
        Some(100) => PlatformError::Validation(detail),
        _ => PlatformError::Posting(detail),
    }
}

/// Pull the most useful message out of an error body
///
/// Understands Graph/Google (`error.message`), OAuth (`error_description`),
/// and Twitter (`detail`, `errors[0].message`) shapes; falls back to the raw
/// body.
pub(crate) fn upstream_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "empty response".to_string()
        } else {
            trimmed.to_string()
        };
    };

    let candidates = [
        value.pointer("/error/message"),
        value.get("error_description"),
        value.get("detail"),
        value.pointer("/errors/0/message"),
        value.get("error"),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    message
}

//! # Authentication Module
//!
//! Shared-secret API key check for the badge routes.
//!
//! ## Usage
//!
//! Every badge route takes the key as a query parameter:
//! ```text
//! GET /garbage_out/?badge_name=ci&api_key=<your-api-key>
//! ```
//!
//! - no `api_key` parameter: `400 Please provide an API key`
//! - wrong key, or no key configured on the server: `403 The provided API key is not valid`

use super::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

pub const MISSING_API_KEY: &str = "Please provide an API key";
pub const INVALID_API_KEY: &str = "The provided API key is not valid";

#[derive(Debug, Deserialize)]
struct ApiKeyParam {
    api_key: Option<String>,
}

/// Constant-time comparison of a supplied key against the configured one.
///
/// Both keys are padded to the same length so `ct_eq` always runs over the
/// same number of bytes and the comparison does not leak the key length.
pub fn key_matches(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// API key middleware for the badge routes.
///
/// Rejected requests never reach a handler.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    // An unparseable query string carries no usable key either
    let provided = Query::<ApiKeyParam>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(param)| param.api_key);

    let Some(provided) = provided else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_api_key",
            path = %request.uri().path(),
            "Missing api_key parameter"
        );
        return Err((StatusCode::BAD_REQUEST, MISSING_API_KEY));
    };

    let is_valid = state
        .api_key
        .as_deref()
        .is_some_and(|expected| key_matches(&provided, expected));

    if is_valid {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_api_key",
            path = %request.uri().path(),
            "Authentication failed: invalid API key"
        );
        Err((StatusCode::FORBIDDEN, INVALID_API_KEY))
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # API Request/Response Types
//!
//! Query parameter structs and the JSON bodies the API returns.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use badgekeep_core::{BadgeError, error_badge};
use serde::{Deserialize, Serialize};

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// Query of the routes addressed by badge name only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadgeNameQuery {
    pub badge_name: Option<String>,
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn ok(backend: &str) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend: backend.to_string(),
            error: None,
        }
    }

    pub fn unavailable(backend: &str, error: impl Into<String>) -> Self {
        Self {
            status: "unavailable".to_string(),
            error: Some(error.into()),
            ..Self::ok(backend)
        }
    }
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

pub const STORE_UNAVAILABLE: &str = "Badge store unavailable";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Status code for a failed badge operation.
pub fn error_status(err: &BadgeError) -> StatusCode {
    match err {
        BadgeError::MissingParameter(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BadgeError::BadRequest(_) => StatusCode::BAD_REQUEST,
        BadgeError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BadgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Caller-facing text for a failed badge operation. Store internals stay in the logs.
fn error_text(err: &BadgeError) -> String {
    match err {
        BadgeError::MissingParameter(msg) | BadgeError::BadRequest(msg) => msg.clone(),
        BadgeError::Unavailable(_) => STORE_UNAVAILABLE.to_string(),
        BadgeError::Internal(_) => INTERNAL_ERROR.to_string(),
    }
}

fn log_server_error(err: &BadgeError) {
    if matches!(err, BadgeError::Unavailable(_) | BadgeError::Internal(_)) {
        tracing::error!(error = %err, "Badge operation failed");
    }
}

/// Plain-text error, for routes whose callers are scripts.
pub fn text_error(err: &BadgeError) -> Response {
    log_server_error(err);
    (error_status(err), error_text(err)).into_response()
}

/// Red "Err" badge, for routes whose callers render badges.
pub fn badge_error(err: &BadgeError) -> Response {
    log_server_error(err);
    (error_status(err), Json(error_badge(&error_text(err)))).into_response()
}

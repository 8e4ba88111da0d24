//! # API Endpoint Handlers
//!
//! Store calls are synchronous, so every handler hands its badge operation
//! to tokio's blocking pool and maps the outcome onto HTTP.

use super::{
    AppState, SharedService,
    types::{BadgeNameQuery, HealthResponse, badge_error, text_error},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use badgekeep_core::{BadgeError, BadgeStore, WriteOutcome, WriteRequest};
use std::sync::Arc;

/// Run a badge operation on the blocking pool.
async fn run_blocking<T, F>(service: &SharedService, op: F) -> Result<T, BadgeError>
where
    T: Send + 'static,
    F: FnOnce(&SharedService) -> Result<T, BadgeError> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|e| BadgeError::Internal(format!("badge task failed: {e}")))?
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint. Not behind the API key.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.service.store().kind().as_str();
    match run_blocking(&state.service, |service| service.health()).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::ok(backend))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unavailable(backend, e.to_string())),
            )
        }
    }
}

// =============================================================================
// GARBAGE OUT (read badge)
// =============================================================================

/// Read a badge payload, as shields.io's endpoint badge expects it.
pub async fn garbage_out_handler(
    State(state): State<AppState>,
    Query(query): Query<BadgeNameQuery>,
) -> Response {
    let result = run_blocking(&state.service, move |service| {
        service.read_badge(query.badge_name.as_deref())
    })
    .await;

    match result {
        Ok(format) => (StatusCode::OK, Json(format)).into_response(),
        Err(e) => badge_error(&e),
    }
}

// =============================================================================
// GARBAGE IN (write badge)
// =============================================================================

/// Create, replace or touch a badge.
pub async fn garbage_in_handler(
    State(state): State<AppState>,
    Query(request): Query<WriteRequest>,
) -> Response {
    let name = request.badge_name.clone().unwrap_or_default();
    let result = run_blocking(&state.service, move |service| {
        service.write_badge(&request)
    })
    .await;

    match result {
        Ok(outcome) => {
            match outcome {
                WriteOutcome::Stored => tracing::info!(badge = %name, "Badge stored"),
                WriteOutcome::MessageUpdated => {
                    tracing::info!(badge = %name, "Badge message updated");
                }
            }
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => text_error(&e),
    }
}

// =============================================================================
// LIST HANDLER
// =============================================================================

/// Every stored badge document, stored message included even when stale.
pub async fn list_handler(State(state): State<AppState>) -> Response {
    match run_blocking(&state.service, |service| service.list_badges()).await {
        Ok(documents) => (StatusCode::OK, Json(documents)).into_response(),
        Err(e) => text_error(&e),
    }
}

// =============================================================================
// DELETE HANDLER
// =============================================================================

/// Delete the badge named by `badge_name`. Unknown names succeed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Query(query): Query<BadgeNameQuery>,
) -> Response {
    let name = query.badge_name.clone().unwrap_or_default();
    let result = run_blocking(&state.service, move |service| {
        service.delete_badge(query.badge_name.as_deref())
    })
    .await;

    match result {
        Ok(()) => {
            tracing::info!(badge = %name, "Badge deleted");
            StatusCode::OK.into_response()
        }
        Err(e) => text_error(&e),
    }
}

//! # badgekeep HTTP API Module
//!
//! This module implements the HTTP server using axum.
//!
//! ## Endpoints
//!
//! All `GET`, driven by query parameters:
//!
//! - `/garbage_out/?badge_name=` - Read a badge (shields.io endpoint payload)
//! - `/garbage_in/?badge_name=&badge_data=|message=[&expire=]` - Write a badge
//! - `/list/` - Every stored badge document
//! - `/delete?badge_name=` - Delete a badge
//! - `/health` - Health check (no API key)
//!
//! Every route but `/health` requires `api_key`.

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for integration tests (via `badgekeep::api::*`)
pub use auth::{INVALID_API_KEY, MISSING_API_KEY, key_matches};
pub use middleware::{TOO_MANY_PUSHES, create_push_limiter};
pub use types::{BadgeNameQuery, HealthResponse, INTERNAL_ERROR, STORE_UNAVAILABLE};

use crate::error::AppError;
use axum::{Router, middleware as axum_middleware, routing::get};
use badgekeep_core::{Backend, BadgeService, BadgeStore};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Badge service shared across requests.
pub type SharedService = Arc<BadgeService<Backend>>;

/// Shared server state: the badge service and the expected API key.
#[derive(Clone)]
pub struct AppState {
    pub service: SharedService,
    /// `None` means no key is configured and every supplied key is rejected.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    /// Create app state around a service.
    #[must_use]
    pub fn new(service: BadgeService<Backend>, api_key: Option<String>) -> Self {
        Self {
            service: Arc::new(service),
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. Authentication - `api_key` query parameter (badge routes only)
/// 3. Push throttling - per-badge budget on `/garbage_in/` (if `rate_limit > 0`)
pub fn create_router(state: AppState, rate_limit: u32) -> Router {
    if state.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "No API_KEY configured - every badge request will be rejected with 403. \
             Set the API_KEY environment variable to accept callers."
        );
    }

    let garbage_in = match create_push_limiter(rate_limit) {
        Some(limiter) => {
            tracing::info!("Push throttling enabled: {} updates/second per badge", rate_limit);
            get(handlers::garbage_in_handler).layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::push_rate_limit_middleware,
            ))
        }
        None => {
            tracing::info!("Push throttling disabled");
            get(handlers::garbage_in_handler)
        }
    };

    Router::new()
        .route("/garbage_out/", get(handlers::garbage_out_handler))
        .route("/garbage_in/", garbage_in)
        .route("/list/", get(handlers::list_handler))
        .route("/delete", get(handlers::delete_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_middleware,
        ))
        // Added after the auth layer so load balancers can probe without a key
        .route("/health", get(handlers::health_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState, rate_limit: u32) -> Result<(), AppError> {
    let backend = state.service.store().kind();
    let router = create_router(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!(%backend, "badgekeep HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl+C: {}", e);
        // Without a signal handler, run until killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

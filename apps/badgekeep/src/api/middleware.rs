//! # Push Throttling
//!
//! Optional per-badge limit on `/garbage_in/`.
//!
//! Each badge name gets its own budget, so one noisy CI job cannot starve
//! other pushers. Reads (`/garbage_out/`) are never throttled: shields.io
//! would render a 429 as a broken badge.
//!
//! ## Configuration
//!
//! - `BADGEKEEP_RATE_LIMIT`: pushes per second per badge (default: 0, disabled)

use super::types::BadgeNameQuery;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub const TOO_MANY_PUSHES: &str = "Too many updates for this badge";

/// Push budget shared by all requests, keyed by badge name.
pub type PushRateLimiter = Arc<DefaultKeyedRateLimiter<String>>;

/// Limiter allowing `pushes_per_second` writes to each badge.
///
/// Returns `None` for 0, which disables throttling.
pub fn create_push_limiter(pushes_per_second: u32) -> Option<PushRateLimiter> {
    let rate = NonZeroU32::new(pushes_per_second)?;
    Some(Arc::new(RateLimiter::keyed(Quota::per_second(rate))))
}

/// Reject a push once its badge has spent its budget.
///
/// Requests without `badge_name` share the empty key; the handler rejects
/// them anyway.
pub async fn push_rate_limit_middleware(
    State(limiter): State<PushRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let badge = Query::<BadgeNameQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.badge_name)
        .unwrap_or_default();

    if limiter.check_key(&badge).is_err() {
        tracing::warn!(event = "rate_limited", badge = %badge, "Push rate exceeded");
        return Err((StatusCode::TOO_MANY_REQUESTS, TOO_MANY_PUSHES));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_disables_limiting() {
        assert!(create_push_limiter(0).is_none());
    }

    #[test]
    fn budget_is_per_badge() {
        let Some(limiter) = create_push_limiter(1) else {
            unreachable!("non-zero rate builds a limiter");
        };
        assert!(limiter.check_key(&"ci".to_string()).is_ok());
        assert!(limiter.check_key(&"ci".to_string()).is_err());
        assert!(limiter.check_key(&"docs".to_string()).is_ok());
    }
}

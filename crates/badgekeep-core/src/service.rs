//! # Badge Service
//!
//! The four badge operations, on top of any [`BadgeStore`]:
//!
//! - `read_badge`: the badge payload, with `message` forced to `"AWOL"` once stale
//! - `write_badge`: create/replace from `badge_data`, or update `message` in place
//! - `list_badges`: every stored document
//! - `delete_badge`: remove a badge, missing ones included
//!
//! The service keeps no state of its own beyond the store handle and clock.

use crate::{
    BadgeDocument, BadgeError, BadgeStore, Clock, DEFAULT_EXPIRE_SECS, SystemClock,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

// =============================================================================
// CALLER-FACING MESSAGES
// =============================================================================

/// Read without a badge name.
pub const NO_NAME_PROVIDED: &str = "no name provided";
/// Read of a badge that does not exist.
pub const NO_BADGE_DATA: &str = "no badge data";
/// Write or delete without a badge name.
pub const MISSING_BADGE_NAME: &str = "Please provide badge name";
/// Write with neither `badge_data` nor `message`.
pub const MISSING_PAYLOAD: &str = "Please provide message or badge data";
/// Message update on a badge that does not exist.
pub const BADGE_NOT_FOUND: &str = "Badge name not found";

// =============================================================================
// WRITE REQUEST
// =============================================================================

/// Input of a badge write, as it arrives in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WriteRequest {
    pub badge_name: Option<String>,
    /// Badge payload in JSON with single quotes allowed in place of double quotes.
    pub badge_data: Option<String>,
    pub message: Option<String>,
    /// Expiry window in seconds; defaults to 60.
    pub expire: Option<String>,
}

/// What a successful write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Whole document created or replaced from `badge_data`.
    Stored,
    /// `format.message` and `meta.last_seen` updated on an existing badge.
    MessageUpdated,
}

/// Turn single-quoted pseudo-JSON into JSON by swapping every `'` for `"`.
///
/// The swap also hits apostrophes inside strict JSON, so a payload carrying
/// one fails to parse: badges cannot contain apostrophes.
#[must_use]
pub fn normalize_badge_data(raw: &str) -> String {
    raw.replace('\'', "\"")
}

/// Parse `badge_data` into a badge payload object.
pub fn parse_badge_data(raw: &str) -> Result<Map<String, Value>, BadgeError> {
    match serde_json::from_str::<Value>(&normalize_badge_data(raw)) {
        Ok(Value::Object(format)) => Ok(format),
        Ok(_) => Err(BadgeError::BadRequest(
            "badge_data must be a JSON object".to_string(),
        )),
        Err(e) => Err(BadgeError::BadRequest(format!(
            "badge_data is not valid JSON: {e}"
        ))),
    }
}

/// Parse the `expire` parameter, defaulting to [`DEFAULT_EXPIRE_SECS`].
pub fn parse_expire(raw: Option<&str>) -> Result<f64, BadgeError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_EXPIRE_SECS);
    };
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(BadgeError::BadRequest(format!(
            "expire must be a non-negative number of seconds, got {raw:?}"
        ))),
    }
}

// =============================================================================
// BADGE SERVICE
// =============================================================================

/// Badge operations over an injected store.
pub struct BadgeService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for BadgeService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: BadgeStore> BadgeService<S> {
    /// Service on the wall clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Service on a caller-supplied clock.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the payload of badge `name` as seen now.
    ///
    /// Stale badges come back with `message` replaced by `"AWOL"`; the
    /// stored document is left alone.
    pub fn read_badge(&self, name: Option<&str>) -> Result<Map<String, Value>, BadgeError> {
        let name =
            name.ok_or_else(|| BadgeError::MissingParameter(NO_NAME_PROVIDED.to_string()))?;
        let document = self
            .store
            .get_value(name)?
            .ok_or_else(|| BadgeError::MissingParameter(NO_BADGE_DATA.to_string()))?;
        Ok(document.view_at(self.clock.now()))
    }

    /// Create, replace or touch a badge.
    ///
    /// `badge_data` wins over `message` when both are given. A message
    /// update on an unknown badge fails without touching the store.
    pub fn write_badge(&self, request: &WriteRequest) -> Result<WriteOutcome, BadgeError> {
        let name = request
            .badge_name
            .as_deref()
            .ok_or_else(|| BadgeError::MissingParameter(MISSING_BADGE_NAME.to_string()))?;

        if let Some(raw) = request.badge_data.as_deref() {
            let expires = parse_expire(request.expire.as_deref())?;
            let format = parse_badge_data(raw)?;
            let document = BadgeDocument::new(format, self.clock.now(), expires);
            self.store.store_value(name, &document)?;
            return Ok(WriteOutcome::Stored);
        }

        let message = request
            .message
            .as_deref()
            .ok_or_else(|| BadgeError::MissingParameter(MISSING_PAYLOAD.to_string()))?;

        if !self.store.contains(name)? {
            return Err(BadgeError::MissingParameter(BADGE_NOT_FOUND.to_string()));
        }
        self.store.set_message(name, message, self.clock.now())?;
        Ok(WriteOutcome::MessageUpdated)
    }

    /// Every stored document, unmodified by staleness.
    pub fn list_badges(&self) -> Result<Vec<BadgeDocument>, BadgeError> {
        Ok(self.store.list()?)
    }

    /// Delete badge `name`. Unknown names succeed.
    pub fn delete_badge(&self, name: Option<&str>) -> Result<(), BadgeError> {
        let name =
            name.ok_or_else(|| BadgeError::MissingParameter(MISSING_BADGE_NAME.to_string()))?;
        Ok(self.store.delete(name)?)
    }

    /// Check the store is reachable.
    pub fn health(&self) -> Result<(), BadgeError> {
        Ok(self.store.ping()?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, MemoryStore};
    use serde_json::json;

    fn service_at(now: f64) -> (BadgeService<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        let service = BadgeService::with_clock(MemoryStore::new(), clock.clone());
        (service, clock)
    }

    fn write(name: &str, data: Option<&str>, message: Option<&str>) -> WriteRequest {
        WriteRequest {
            badge_name: Some(name.to_string()),
            badge_data: data.map(str::to_string),
            message: message.map(str::to_string),
            expire: None,
        }
    }

    #[test]
    fn normalize_swaps_every_single_quote() {
        assert_eq!(
            normalize_badge_data("{'label': 'it's'}"),
            r#"{"label": "it"s"}"#
        );
    }

    #[test]
    fn parse_expire_defaults_and_validates() {
        assert_eq!(parse_expire(None), Ok(60.0));
        assert_eq!(parse_expire(Some("300")), Ok(300.0));
        assert_eq!(parse_expire(Some("1.5")), Ok(1.5));
        assert!(parse_expire(Some("-1")).is_err());
        assert!(parse_expire(Some("NaN")).is_err());
        assert!(parse_expire(Some("soon")).is_err());
    }

    #[test]
    fn write_then_read_round_trips_format() {
        let (service, clock) = service_at(1_000.0);
        let data = "{'schemaVersion': 1, 'label': 'build', 'message': 'passing', 'color': 'green'}";
        assert_eq!(
            service.write_badge(&write("ci", Some(data), None)),
            Ok(WriteOutcome::Stored)
        );

        clock.advance(59.0);
        let format = service.read_badge(Some("ci")).expect("read");
        assert_eq!(
            Value::Object(format),
            json!({"schemaVersion": 1, "label": "build", "message": "passing", "color": "green"})
        );
    }

    #[test]
    fn stale_read_is_awol_but_not_persisted() {
        let (service, clock) = service_at(1_000.0);
        service
            .write_badge(&write("ci", Some("{'message': 'passing'}"), None))
            .expect("write");

        clock.advance(61.0);
        let format = service.read_badge(Some("ci")).expect("read");
        assert_eq!(format.get("message"), Some(&json!("AWOL")));

        let listed = service.list_badges().expect("list");
        assert_eq!(listed[0].format.get("message"), Some(&json!("passing")));
    }

    #[test]
    fn custom_expire_is_stored() {
        let (service, clock) = service_at(0.0);
        let mut request = write("ci", Some("{'message': 'up'}"), None);
        request.expire = Some("600".to_string());
        service.write_badge(&request).expect("write");

        clock.set(500.0);
        let format = service.read_badge(Some("ci")).expect("read");
        assert_eq!(format.get("message"), Some(&json!("up")));
        assert_eq!(service.list_badges().expect("list")[0].meta.expires, 600.0);
    }

    #[test]
    fn message_update_touches_only_message_and_last_seen() {
        let (service, clock) = service_at(10.0);
        let mut request = write("ci", Some("{'label': 'x', 'message': 'a'}"), None);
        request.expire = Some("100".to_string());
        service.write_badge(&request).expect("write");

        clock.set(90.0);
        assert_eq!(
            service.write_badge(&write("ci", None, Some("b"))),
            Ok(WriteOutcome::MessageUpdated)
        );

        let format = service.read_badge(Some("ci")).expect("read");
        assert_eq!(format.get("label"), Some(&json!("x")));
        assert_eq!(format.get("message"), Some(&json!("b")));

        let stored = service.store().get_value("ci").expect("get").expect("present");
        assert_eq!(stored.meta.last_seen, 90.0);
        assert_eq!(stored.meta.expires, 100.0);
    }

    #[test]
    fn message_refresh_revives_stale_badge() {
        let (service, clock) = service_at(0.0);
        service
            .write_badge(&write("ci", Some("{'message': 'a'}"), None))
            .expect("write");
        clock.set(1_000.0);
        service
            .write_badge(&write("ci", None, Some("back")))
            .expect("touch");
        let format = service.read_badge(Some("ci")).expect("read");
        assert_eq!(format.get("message"), Some(&json!("back")));
    }

    #[test]
    fn message_on_unknown_badge_fails_without_mutation() {
        let (service, _clock) = service_at(0.0);
        let err = service.write_badge(&write("ghost", None, Some("b")));
        assert_eq!(
            err,
            Err(BadgeError::MissingParameter(BADGE_NOT_FOUND.to_string()))
        );
        assert!(service.store().is_empty());
    }

    #[test]
    fn badge_data_takes_precedence_over_message() {
        let (service, _clock) = service_at(0.0);
        let outcome = service.write_badge(&write("ci", Some("{'message': 'data'}"), Some("msg")));
        assert_eq!(outcome, Ok(WriteOutcome::Stored));
        let format = service.read_badge(Some("ci")).expect("read");
        assert_eq!(format.get("message"), Some(&json!("data")));
    }

    #[test]
    fn write_requires_name_and_payload() {
        let (service, _clock) = service_at(0.0);
        assert_eq!(
            service.write_badge(&WriteRequest::default()),
            Err(BadgeError::MissingParameter(MISSING_BADGE_NAME.to_string()))
        );
        assert_eq!(
            service.write_badge(&write("ci", None, None)),
            Err(BadgeError::MissingParameter(MISSING_PAYLOAD.to_string()))
        );
    }

    #[test]
    fn malformed_badge_data_is_bad_request() {
        let (service, _clock) = service_at(0.0);
        assert!(matches!(
            service.write_badge(&write("ci", Some("{'label': "), None)),
            Err(BadgeError::BadRequest(_))
        ));
        assert!(matches!(
            service.write_badge(&write("ci", Some("[1, 2]"), None)),
            Err(BadgeError::BadRequest(_))
        ));
        assert!(service.store().is_empty());
    }

    #[test]
    fn read_errors() {
        let (service, _clock) = service_at(0.0);
        assert_eq!(
            service.read_badge(None),
            Err(BadgeError::MissingParameter(NO_NAME_PROVIDED.to_string()))
        );
        assert_eq!(
            service.read_badge(Some("nope")),
            Err(BadgeError::MissingParameter(NO_BADGE_DATA.to_string()))
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let (service, _clock) = service_at(0.0);
        service
            .write_badge(&write("ci", Some("{'message': 'a'}"), None))
            .expect("write");
        service.delete_badge(Some("other")).expect("delete unknown");
        assert_eq!(service.list_badges().expect("list").len(), 1);
        service.delete_badge(Some("ci")).expect("delete");
        assert!(service.list_badges().expect("list").is_empty());
        assert_eq!(
            service.delete_badge(None),
            Err(BadgeError::MissingParameter(MISSING_BADGE_NAME.to_string()))
        );
    }
}

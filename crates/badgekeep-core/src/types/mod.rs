//! # Badge Document Types
//!
//! A badge document is the unit of storage, addressed by its badge name:
//!
//! ```text
//! {"format": {...shields.io endpoint payload...},
//!  "meta":   {"last_seen": <unix seconds, float>, "expires": <seconds>}}
//! ```
//!
//! `format` is opaque apart from its `message` field. Staleness is derived
//! on read from `meta` and never written back.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value, json};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Expiry window applied when a writer does not pass one, in seconds.
pub const DEFAULT_EXPIRE_SECS: f64 = 60.0;

/// Message shown in place of the stored one once a badge has gone stale.
pub const STALE_MESSAGE: &str = "AWOL";

/// Key of the overwritable field inside `format`.
pub const MESSAGE_FIELD: &str = "message";

// =============================================================================
// BADGE META
// =============================================================================

/// Bookkeeping stored next to the badge payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgeMeta {
    /// When the format was last set or touched (seconds since the epoch).
    #[serde(deserialize_with = "lenient_seconds")]
    pub last_seen: f64,
    /// Staleness window relative to `last_seen`, in seconds.
    #[serde(deserialize_with = "lenient_seconds")]
    pub expires: f64,
}

impl BadgeMeta {
    /// Meta for a badge written at `now`.
    #[must_use]
    pub const fn new(now: f64, expires: f64) -> Self {
        Self {
            last_seen: now,
            expires,
        }
    }

    /// `true` once `last_seen + expires` lies strictly before `now`.
    #[must_use]
    #[allow(clippy::float_arithmetic)]
    pub fn is_stale(&self, now: f64) -> bool {
        self.last_seen + self.expires < now
    }
}

/// Accepts seconds as a JSON number or as a numeric string.
///
/// Older writers stored the raw `expire` query value, so documents in a
/// long-lived store can carry `"expires": "60"`. `NaN` and infinities are
/// rejected: either one would keep a badge from ever going stale.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed: Result<f64, D::Error> = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom("seconds out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid seconds value: {s:?}"))),
        other => Err(de::Error::custom(format!(
            "expected seconds as number or string, got {other}"
        ))),
    };

    let secs = parsed?;
    if secs.is_finite() {
        Ok(secs)
    } else {
        Err(de::Error::custom(format!("seconds must be finite, got {secs}")))
    }
}

// =============================================================================
// BADGE DOCUMENT
// =============================================================================

/// A stored badge: display payload plus meta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDocument {
    /// shields.io endpoint payload (`schemaVersion`, `label`, `message`, `color`, ...).
    pub format: Map<String, Value>,
    pub meta: BadgeMeta,
}

impl BadgeDocument {
    /// A fresh document written at `now`.
    #[must_use]
    pub fn new(format: Map<String, Value>, now: f64, expires: f64) -> Self {
        Self {
            format,
            meta: BadgeMeta::new(now, expires),
        }
    }

    /// Overwrite `format.message` and refresh `last_seen`.
    pub fn touch_message(&mut self, message: &str, now: f64) {
        self.format
            .insert(MESSAGE_FIELD.to_string(), Value::String(message.to_string()));
        self.meta.last_seen = now;
    }

    /// The payload a reader sees at `now`: the stored format, with the
    /// message replaced by [`STALE_MESSAGE`] if the badge has gone stale.
    #[must_use]
    pub fn view_at(&self, now: f64) -> Map<String, Value> {
        let mut format = self.format.clone();
        if self.meta.is_stale(now) {
            format.insert(
                MESSAGE_FIELD.to_string(),
                Value::String(STALE_MESSAGE.to_string()),
            );
        }
        format
    }

    /// Decode a stored JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode for storage.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// ERROR BADGE
// =============================================================================

/// A red "Err" badge carrying `message`, returned to badge readers on failure.
#[must_use]
pub fn error_badge(message: &str) -> Value {
    json!({
        "schemaVersion": 1,
        "label": "Err",
        "message": message,
        "color": "red",
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn format(message: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("schemaVersion".to_string(), json!(1));
        map.insert("label".to_string(), json!("build"));
        map.insert("message".to_string(), json!(message));
        map.insert("color".to_string(), json!("green"));
        map
    }

    #[test]
    fn fresh_badge_is_returned_unchanged() {
        let doc = BadgeDocument::new(format("passing"), 1_000.0, 60.0);
        assert_eq!(doc.view_at(1_030.0), format("passing"));
    }

    #[test]
    fn badge_at_exact_deadline_is_not_stale() {
        let doc = BadgeDocument::new(format("passing"), 1_000.0, 60.0);
        assert!(!doc.meta.is_stale(1_060.0));
        assert!(doc.meta.is_stale(1_060.5));
    }

    #[test]
    fn stale_view_does_not_touch_stored_format() {
        let doc = BadgeDocument::new(format("passing"), 1_000.0, 60.0);
        let view = doc.view_at(2_000.0);
        assert_eq!(view.get("message"), Some(&json!("AWOL")));
        assert_eq!(view.get("label"), Some(&json!("build")));
        assert_eq!(doc.format.get("message"), Some(&json!("passing")));
    }

    #[test]
    fn touch_message_keeps_expiry_and_other_fields() {
        let mut doc = BadgeDocument::new(format("a"), 1_000.0, 100.0);
        doc.touch_message("b", 1_500.0);
        assert_eq!(doc.format.get("message"), Some(&json!("b")));
        assert_eq!(doc.format.get("label"), Some(&json!("build")));
        assert_eq!(doc.meta, BadgeMeta::new(1_500.0, 100.0));
    }

    #[test]
    fn touch_message_adds_missing_message_field() {
        let mut doc = BadgeDocument::new(Map::new(), 0.0, 60.0);
        doc.touch_message("hello", 5.0);
        assert_eq!(doc.format.get("message"), Some(&json!("hello")));
    }

    #[test]
    fn legacy_string_seconds_are_accepted() {
        let text = r#"{"format":{"message":"ok"},"meta":{"last_seen":"1700000000.5","expires":"60"}}"#;
        let doc = BadgeDocument::from_json(text).expect("decode");
        assert_eq!(doc.meta, BadgeMeta::new(1_700_000_000.5, 60.0));
    }

    #[test]
    fn non_numeric_seconds_are_rejected() {
        let text = r#"{"format":{},"meta":{"last_seen":1.0,"expires":"soon"}}"#;
        assert!(BadgeDocument::from_json(text).is_err());
    }

    #[test]
    fn non_finite_seconds_are_rejected() {
        for value in ["NaN", "inf", "-inf", "infinity"] {
            let expires =
                format!(r#"{{"format":{{}},"meta":{{"last_seen":1.0,"expires":"{value}"}}}}"#);
            assert!(BadgeDocument::from_json(&expires).is_err(), "expires = {value}");

            let last_seen =
                format!(r#"{{"format":{{}},"meta":{{"last_seen":"{value}","expires":60}}}}"#);
            assert!(BadgeDocument::from_json(&last_seen).is_err(), "last_seen = {value}");
        }
    }

    #[test]
    fn document_without_meta_is_rejected() {
        assert!(BadgeDocument::from_json(r#"{"format":{"message":"x"}}"#).is_err());
    }

    #[test]
    fn stored_layout_is_format_then_meta() {
        let doc = BadgeDocument::new(format("ok"), 10.0, 60.0);
        let text = doc.to_json().expect("encode");
        assert!(text.starts_with(r#"{"format":{"schemaVersion":1"#));
        assert!(text.ends_with(r#""meta":{"last_seen":10.0,"expires":60.0}}"#));
    }

    #[test]
    fn error_badge_shape() {
        assert_eq!(
            error_badge("no name provided"),
            json!({"schemaVersion": 1, "label": "Err", "message": "no name provided", "color": "red"})
        );
    }
}

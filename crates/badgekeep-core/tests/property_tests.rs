//! # Property-Based Tests
//!
//! Badge lifecycle invariants checked with proptest against the memory store.

#![allow(clippy::float_arithmetic)]

use badgekeep_core::{
    BadgeService, BadgeStore, Clock, ManualClock, MemoryStore, WriteOutcome, WriteRequest,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn service_at(now: f64) -> (BadgeService<MemoryStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let service = BadgeService::with_clock(MemoryStore::new(), clock.clone());
    (service, clock)
}

/// Strict JSON with double quotes, so the quote swap leaves it alone.
fn badge_data(label: &str, message: &str) -> String {
    json!({"schemaVersion": 1, "label": label, "message": message, "color": "blue"}).to_string()
}

fn store_request(name: &str, data: String, expire: u32) -> WriteRequest {
    WriteRequest {
        badge_name: Some(name.to_string()),
        badge_data: Some(data),
        message: None,
        expire: Some(expire.to_string()),
    }
}

// Strings without quotes of either kind survive the quote swap unchanged.
const TEXT: &str = "[a-zA-Z0-9 _.:-]{0,24}";

proptest! {
    /// A fresh badge reads back exactly as written.
    #[test]
    fn fresh_badge_round_trips(
        name in "[a-z][a-z0-9_-]{0,15}",
        label in TEXT,
        message in TEXT,
        expire in 1u32..10_000,
        elapsed in 0u32..10_000,
    ) {
        prop_assume!(elapsed <= expire);
        let (service, clock) = service_at(1_700_000_000.0);
        let data = badge_data(&label, &message);
        prop_assert_eq!(
            service.write_badge(&store_request(&name, data.clone(), expire)),
            Ok(WriteOutcome::Stored)
        );

        clock.advance(f64::from(elapsed));
        let format = service.read_badge(Some(&name)).expect("read");
        let expected: Value = serde_json::from_str(&data).expect("json");
        prop_assert_eq!(Value::Object(format), expected);
    }

    /// Stale reads say AWOL and leave the stored message alone.
    #[test]
    fn staleness_is_never_persisted(
        message in TEXT,
        expire in 0u32..1_000,
        overshoot in 1u32..1_000,
    ) {
        let (service, clock) = service_at(0.0);
        service
            .write_badge(&store_request("ci", badge_data("l", &message), expire))
            .expect("write");

        clock.set(f64::from(expire) + f64::from(overshoot));
        let format = service.read_badge(Some("ci")).expect("read");
        prop_assert_eq!(format.get("message"), Some(&json!("AWOL")));

        let listed = service.list_badges().expect("list");
        prop_assert_eq!(listed.len(), 1);
        prop_assert_eq!(listed[0].format.get("message"), Some(&json!(message)));
    }

    /// Message updates change nothing but `message` and `last_seen`.
    #[test]
    fn message_update_preserves_everything_else(
        label in TEXT,
        first in TEXT,
        second in TEXT,
        expire in 1u32..10_000,
        later in 0u32..10_000,
    ) {
        let (service, clock) = service_at(100.0);
        service
            .write_badge(&store_request("ci", badge_data(&label, &first), expire))
            .expect("write");
        let before = service.store().get_value("ci").expect("get").expect("present");

        clock.advance(f64::from(later));
        let update = WriteRequest {
            badge_name: Some("ci".to_string()),
            message: Some(second.clone()),
            ..WriteRequest::default()
        };
        prop_assert_eq!(service.write_badge(&update), Ok(WriteOutcome::MessageUpdated));

        let after = service.store().get_value("ci").expect("get").expect("present");
        let mut expected: Map<String, Value> = before.format.clone();
        expected.insert("message".to_string(), json!(second));
        prop_assert_eq!(after.format, expected);
        prop_assert_eq!(after.meta.expires, before.meta.expires);
        prop_assert_eq!(after.meta.last_seen, clock.now());
    }

    /// Deleting a name that was never written leaves the store as it was.
    #[test]
    fn delete_of_unknown_name_is_noop(
        names in proptest::collection::btree_set("[a-z]{1,8}", 0..8),
        ghost in "[A-Z]{1,8}",
    ) {
        let (service, _clock) = service_at(0.0);
        for name in &names {
            service
                .write_badge(&store_request(name, badge_data("l", "m"), 60))
                .expect("write");
        }
        let before = service.list_badges().expect("list");
        service.delete_badge(Some(&ghost)).expect("delete");
        prop_assert_eq!(service.list_badges().expect("list"), before);
    }
}

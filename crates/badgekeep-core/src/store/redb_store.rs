//! # redb-backed Badge Storage
//!
//! A single-file badge store using the redb embedded database, for
//! deployments that do not run Redis.
//!
//! Documents are stored as JSON text in one table keyed by badge name.
//! Every operation runs in its own transaction, so `set_message` is atomic
//! here even though the Redis backend does not guarantee that.

use super::{BackendKind, BadgeStore};
use crate::{BadgeDocument, StoreError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for badges: badge name -> JSON document text
const BADGES: TableDefinition<&str, &str> = TableDefinition::new("badges");

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn decode(key: &str, text: &str) -> Result<BadgeDocument, StoreError> {
    BadgeDocument::from_json(text).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn encode(key: &str, document: &BadgeDocument) -> Result<String, StoreError> {
    document.to_json().map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Durable badge store in a redb file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a badge database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Create the table up front so read transactions never miss it
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(BADGES).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }
}

impl BadgeStore for RedbStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Redb
    }

    fn store_value(&self, key: &str, document: &BadgeDocument) -> Result<(), StoreError> {
        let text = encode(key, document)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(BADGES).map_err(io_err)?;
            table.insert(key, text.as_str()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn get_value(&self, key: &str) -> Result<Option<BadgeDocument>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(BADGES).map_err(io_err)?;
        let stored = table
            .get(key)
            .map_err(io_err)?
            .map(|guard| guard.value().to_string());
        stored.map(|text| decode(key, &text)).transpose()
    }

    fn set_message(&self, key: &str, message: &str, now: f64) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(BADGES).map_err(io_err)?;
            let stored = table
                .get(key)
                .map_err(io_err)?
                .map(|guard| guard.value().to_string())
                .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

            let mut document = decode(key, &stored)?;
            document.touch_message(message, now);
            let text = encode(key, &document)?;
            table.insert(key, text.as_str()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(BADGES).map_err(io_err)?;
        Ok(table.get(key).map_err(io_err)?.is_some())
    }

    fn list(&self) -> Result<Vec<BadgeDocument>, StoreError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(BADGES).map_err(io_err)?;

        let mut documents = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            documents.push(decode(key.value(), value.value())?);
        }
        Ok(documents)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(BADGES).map_err(io_err)?;
            table.remove(key).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.db.begin_read().map(|_| ()).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use tempfile::TempDir;

    fn open_temp() -> (RedbStore, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let store = RedbStore::open(dir.path().join("badges.redb")).expect("open");
        (store, dir)
    }

    fn doc(message: &str, now: f64) -> BadgeDocument {
        let mut format = Map::new();
        format.insert("label".to_string(), json!("x"));
        format.insert("message".to_string(), json!(message));
        BadgeDocument::new(format, now, 100.0)
    }

    #[test]
    fn store_and_get_round_trip() {
        let (store, _dir) = open_temp();
        store.store_value("ci", &doc("a", 1.0)).expect("store");
        assert_eq!(store.get_value("ci").expect("get"), Some(doc("a", 1.0)));
        assert_eq!(store.get_value("other").expect("get"), None);
    }

    #[test]
    fn set_message_keeps_expiry() {
        let (store, _dir) = open_temp();
        store.store_value("ci", &doc("a", 1.0)).expect("store");
        store.set_message("ci", "b", 50.0).expect("set");

        let stored = store.get_value("ci").expect("get").expect("present");
        assert_eq!(stored.format.get("message"), Some(&json!("b")));
        assert_eq!(stored.format.get("label"), Some(&json!("x")));
        assert_eq!(stored.meta.last_seen, 50.0);
        assert_eq!(stored.meta.expires, 100.0);
    }

    #[test]
    fn set_message_missing_key_is_not_found() {
        let (store, _dir) = open_temp();
        assert_eq!(
            store.set_message("ghost", "b", 1.0),
            Err(StoreError::NotFound("ghost".to_string()))
        );
        assert!(!store.contains("ghost").expect("contains"));
    }

    #[test]
    fn list_and_delete() {
        let (store, _dir) = open_temp();
        store.store_value("a", &doc("1", 1.0)).expect("store");
        store.store_value("b", &doc("2", 1.0)).expect("store");
        assert_eq!(store.list().expect("list").len(), 2);

        store.delete("a").expect("delete");
        store.delete("a").expect("delete missing");
        assert_eq!(store.list().expect("list"), vec![doc("2", 1.0)]);
    }

    #[test]
    fn documents_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("badges.redb");
        {
            let store = RedbStore::open(&path).expect("open");
            store.store_value("ci", &doc("kept", 3.0)).expect("store");
        }
        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.get_value("ci").expect("get"), Some(doc("kept", 3.0)));
        assert!(store.ping().is_ok());
    }
}

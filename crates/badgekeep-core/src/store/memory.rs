//! In-memory badge store.

use super::{BackendKind, BadgeStore};
use crate::{BadgeDocument, StoreError};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Volatile store backed by a `BTreeMap`. Lists come back in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    badges: RwLock<BTreeMap<String, BadgeDocument>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored badges.
    pub fn len(&self) -> usize {
        self.badges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BadgeStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn store_value(&self, key: &str, document: &BadgeDocument) -> Result<(), StoreError> {
        self.badges
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), document.clone());
        Ok(())
    }

    fn get_value(&self, key: &str) -> Result<Option<BadgeDocument>, StoreError> {
        Ok(self
            .badges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_message(&self, key: &str, message: &str, now: f64) -> Result<(), StoreError> {
        let mut badges = self.badges.write().unwrap_or_else(PoisonError::into_inner);
        let document = badges
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        document.touch_message(message, now);
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .badges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    fn list(&self) -> Result<Vec<BadgeDocument>, StoreError> {
        Ok(self
            .badges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.badges
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

//! # Badge Stores
//!
//! Key-value storage of badge documents, addressed by badge name.
//!
//! ## Backends
//!
//! - `MemoryStore`: in-process map, volatile (tests, fallback)
//! - `RedbStore`: embedded redb file, durable on a single node
//! - `RedisStore`: external Redis server with the RedisJSON module
//!
//! All three implement [`BadgeStore`]. [`Backend`] wraps whichever one was
//! selected at start-up so the HTTP layer can hold a single concrete type.
//!
//! No backend locks across operations: two writers to the same key race and
//! the last write wins.

mod memory;
mod redb_store;
mod redis;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;
pub use redis::{DEFAULT_REDIS_TIMEOUT, RedisStore};

use crate::{BadgeDocument, StoreError};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// STORE CAPABILITY
// =============================================================================

/// Capability set shared by every badge backend.
pub trait BadgeStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn kind(&self) -> BackendKind;

    /// Replace the whole document at `key` (create-or-replace, no merge).
    fn store_value(&self, key: &str, document: &BadgeDocument) -> Result<(), StoreError>;

    /// Fetch the document at `key`, `None` if absent.
    fn get_value(&self, key: &str) -> Result<Option<BadgeDocument>, StoreError>;

    /// Set `format.message` and refresh `meta.last_seen` on an existing key.
    ///
    /// Fails with [`StoreError::NotFound`] when `key` is absent.
    fn set_message(&self, key: &str, message: &str, now: f64) -> Result<(), StoreError>;

    /// Whether `key` exists.
    fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// Every stored document, in backend order.
    fn list(&self) -> Result<Vec<BadgeDocument>, StoreError>;

    /// Remove `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    Memory,
    Redb,
    #[default]
    Redis,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
            Self::Redis => "redis",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "dummy" => Ok(Self::Memory),
            "redb" | "file" => Ok(Self::Redb),
            "redis" => Ok(Self::Redis),
            other => Err(format!(
                "unknown backend '{other}' (expected memory, redb or redis)"
            )),
        }
    }
}

/// The backend chosen at start-up.
#[derive(Debug)]
pub enum Backend {
    Memory(MemoryStore),
    Redb(RedbStore),
    Redis(RedisStore),
}

impl Backend {
    fn inner(&self) -> &dyn BadgeStore {
        match self {
            Self::Memory(store) => store,
            Self::Redb(store) => store,
            Self::Redis(store) => store,
        }
    }
}

impl From<MemoryStore> for Backend {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<RedbStore> for Backend {
    fn from(store: RedbStore) -> Self {
        Self::Redb(store)
    }
}

impl From<RedisStore> for Backend {
    fn from(store: RedisStore) -> Self {
        Self::Redis(store)
    }
}

impl BadgeStore for Backend {
    fn kind(&self) -> BackendKind {
        self.inner().kind()
    }

    fn store_value(&self, key: &str, document: &BadgeDocument) -> Result<(), StoreError> {
        self.inner().store_value(key, document)
    }

    fn get_value(&self, key: &str) -> Result<Option<BadgeDocument>, StoreError> {
        self.inner().get_value(key)
    }

    fn set_message(&self, key: &str, message: &str, now: f64) -> Result<(), StoreError> {
        self.inner().set_message(key, message, now)
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.inner().contains(key)
    }

    fn list(&self) -> Result<Vec<BadgeDocument>, StoreError> {
        self.inner().list()
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner().delete(key)
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.inner().ping()
    }
}

//! # badgekeep-core
//!
//! The badge logic for badgekeep - THE LOGIC.
//!
//! This crate holds everything that does not speak HTTP:
//! - `types`: badge documents, the staleness rule, error badges
//! - `store`: the `BadgeStore` capability and its backends (memory, redb, Redis)
//! - `service`: the four badge operations on top of a store
//! - `clock`: the time source used for `last_seen` and staleness
//!
//! ## Architectural Constraints
//!
//! - No async: store calls are synchronous round-trips
//! - No logging: the app layer decides what gets traced
//! - No global state: the store is owned by the service and injected by the caller

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod error;
pub mod service;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BadgeError, StoreError};
pub use service::{BadgeService, WriteOutcome, WriteRequest};
pub use store::{
    Backend, BackendKind, BadgeStore, DEFAULT_REDIS_TIMEOUT, MemoryStore, RedbStore, RedisStore,
};
pub use types::{BadgeDocument, BadgeMeta, DEFAULT_EXPIRE_SECS, STALE_MESSAGE, error_badge};

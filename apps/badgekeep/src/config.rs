//! # Configuration
//!
//! Settings are read from the environment once at start-up; CLI flags
//! override them afterwards.
//!
//! | Variable                     | Default          |
//! |------------------------------|------------------|
//! | `DB_HOST`                    | `localhost`      |
//! | `DB_PORT`                    | `6379`           |
//! | `API_KEY`                    | none (no key matches) |
//! | `BADGEKEEP_BACKEND`          | `redis`          |
//! | `BADGEKEEP_DATA`             | `badgekeep.redb` |
//! | `BADGEKEEP_STORE_TIMEOUT_MS` | `5000`           |
//! | `BADGEKEEP_RATE_LIMIT`       | `0` (pushes/s per badge, 0 disables) |
//!
//! `SECRET_KEY` is accepted for compatibility with older deployments and
//! has no effect.

use crate::error::AppError;
use badgekeep_core::{
    Backend, BackendKind, DEFAULT_REDIS_TIMEOUT, MemoryStore, RedbStore, RedisStore,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 6379;
pub const DEFAULT_DATA_PATH: &str = "badgekeep.redb";
pub const DEFAULT_RATE_LIMIT: u32 = 0;

/// Store and access settings for one process.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendKind,
    pub db_host: String,
    pub db_port: u16,
    pub data_path: PathBuf,
    /// Shared secret callers must pass as `api_key`.
    pub api_key: Option<String>,
    pub store_timeout: Duration,
    /// Pushes per second allowed for each badge; 0 disables throttling.
    pub rate_limit: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("backend", &self.backend)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("data_path", &self.data_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("store_timeout", &self.store_timeout)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            api_key: None,
            store_timeout: DEFAULT_REDIS_TIMEOUT,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(host) = lookup("DB_HOST").filter(|h| !h.is_empty()) {
            config.db_host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            config.db_port = parse_var("DB_PORT", &port)?;
        }
        config.api_key = lookup("API_KEY").filter(|k| !k.is_empty());
        if let Some(backend) = lookup("BADGEKEEP_BACKEND") {
            config.backend = backend.parse().map_err(AppError::Config)?;
        }
        if let Some(path) = lookup("BADGEKEEP_DATA").filter(|p| !p.is_empty()) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(ms) = lookup("BADGEKEEP_STORE_TIMEOUT_MS") {
            let ms = parse_var("BADGEKEEP_STORE_TIMEOUT_MS", &ms)?;
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(rps) = lookup("BADGEKEEP_RATE_LIMIT") {
            config.rate_limit = parse_var("BADGEKEEP_RATE_LIMIT", &rps)?;
        }

        Ok(config)
    }

    /// Open the configured store.
    ///
    /// Redis is probed with `PING` so a wrong address fails at start-up
    /// rather than on the first request.
    pub fn open_backend(&self) -> Result<Backend, AppError> {
        let backend = match self.backend {
            BackendKind::Memory => Backend::from(MemoryStore::new()),
            BackendKind::Redb => Backend::from(RedbStore::open(&self.data_path)?),
            BackendKind::Redis => Backend::from(RedisStore::connect(
                &self.db_host,
                self.db_port,
                self.store_timeout,
            )?),
        };
        Ok(backend)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{name} has invalid value {value:?}")))
}

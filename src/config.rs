//! Runtime configuration.
//!
//! Defaults can be overridden from the environment:
//!
//! | variable                  | field                        |
//! |---------------------------|------------------------------|
//! | `HEATQUIZ_DATA_DIR`       | persistent store directory   |
//! | `HEATQUIZ_HISTORY_VIEW`   | `history_view_len`           |
//! | `HEATQUIZ_SYNC_ON_WRITE`  | `store.sync_on_write`        |

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{QuizError, QuizResult};
use crate::gateway::RecordGateway;
use crate::history::DEFAULT_VIEW_LEN;
use crate::session::QuizSession;
use crate::storage::{InMemoryRecordStore, MemoryConnector, DEFAULT_MAX_HISTORY_BYTES};

/// Environment variable naming the persistent store directory.
pub const ENV_DATA_DIR: &str = "HEATQUIZ_DATA_DIR";
/// Environment variable overriding the history view length.
pub const ENV_HISTORY_VIEW: &str = "HEATQUIZ_HISTORY_VIEW";
/// Environment variable toggling fsync after every insert.
pub const ENV_SYNC_ON_WRITE: &str = "HEATQUIZ_SYNC_ON_WRITE";

/// Where submissions are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local, lost on exit.
    Memory,
    /// File-backed store in the given directory.
    Persistent {
        /// Store directory, created on first connect.
        dir: PathBuf,
    },
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend to connect to.
    pub backend: StoreBackend,
    /// Whether to fsync after every insert.
    pub sync_on_write: bool,
    /// Maximum size of an encoded `history_data` value (bytes).
    pub max_history_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            sync_on_write: true,
            max_history_bytes: DEFAULT_MAX_HISTORY_BYTES,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    /// Rows shown in the history table.
    pub history_view_len: usize,
    /// Record store settings.
    pub store: StoreConfig,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            history_view_len: DEFAULT_VIEW_LEN,
            store: StoreConfig::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> QuizResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(QuizError::config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}

impl QuizConfig {
    const MIN_HISTORY_BYTES: usize = 1024;

    /// Defaults overridden by the process environment.
    pub fn from_env() -> QuizResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> QuizResult<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.store.backend = StoreBackend::Persistent {
                dir: PathBuf::from(dir),
            };
        }
        if let Some(view) = lookup(ENV_HISTORY_VIEW) {
            config.history_view_len = view.trim().parse().map_err(|_| {
                QuizError::config(format!("{ENV_HISTORY_VIEW}: expected a positive integer, got '{view}'"))
            })?;
        }
        if let Some(sync) = lookup(ENV_SYNC_ON_WRITE) {
            config.store.sync_on_write = parse_bool(ENV_SYNC_ON_WRITE, &sync)?;
        }

        config.validate()
    }

    /// Check the configuration, returning it unchanged if valid.
    pub fn validate(self) -> QuizResult<Self> {
        if self.history_view_len == 0 {
            return Err(QuizError::config("history_view_len must be at least 1"));
        }
        if self.store.max_history_bytes < Self::MIN_HISTORY_BYTES {
            return Err(QuizError::config(format!(
                "max_history_bytes must be at least {} bytes (got {})",
                Self::MIN_HISTORY_BYTES,
                self.store.max_history_bytes
            )));
        }
        Ok(self)
    }

    /// A new session using the configured view length.
    #[must_use]
    pub fn new_session(&self) -> QuizSession {
        QuizSession::with_view_len(self.history_view_len)
    }

    /// A gateway for the configured backend. No connection is made yet.
    pub fn gateway(&self) -> QuizResult<RecordGateway> {
        match &self.store.backend {
            StoreBackend::Memory => {
                let store = InMemoryRecordStore::with_max_history_bytes(self.store.max_history_bytes);
                Ok(RecordGateway::new(MemoryConnector::with_store(Arc::new(store))))
            }
            #[cfg(feature = "persistent")]
            StoreBackend::Persistent { dir } => {
                let cfg = crate::storage::PersistentConfig {
                    sync_on_write: self.store.sync_on_write,
                    max_history_bytes: self.store.max_history_bytes,
                }
                .validate()?;
                Ok(RecordGateway::new(crate::storage::PersistentConnector::new(
                    dir.clone(),
                    cfg,
                )))
            }
            #[cfg(not(feature = "persistent"))]
            StoreBackend::Persistent { .. } => Err(QuizError::config(
                "persistent store requested but the `persistent` feature is disabled",
            )),
        }
    }
}

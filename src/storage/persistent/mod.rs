//! Persistent record store for heatquiz.
//!
//! A store directory holds:
//! - `.lock`: exclusive process lock (flock / LockFileEx)
//! - `records.log`: append-only, CRC-checked log of inserted rows
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │          PersistentRecordStore           │
//! ├──────────────────────────────────────────┤
//! │  rows (RwLock<Vec>)  ←  replay on open   │
//! │          │                               │
//! │          ↓ insert                        │
//! │  RecordLog (append + fsync)              │
//! │          │                               │
//! │  DirLock (.lock)                         │
//! └──────────────────────────────────────────┘
//! ```

mod codec;
mod file_lock;
mod log;
mod store;

pub use file_lock::DirLock;
pub use log::{RecordLog, Replay};
pub use store::{PersistentRecordStore, LOG_FILE};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PersistenceError, QuizError};
use crate::storage::memory::DEFAULT_MAX_HISTORY_BYTES;
use crate::storage::traits::{RecordStore, StorageError, StoreConnector};

/// Configuration for persistent storage.
#[derive(Debug, Clone)]
pub struct PersistentConfig {
    /// Whether to fsync after every insert (slower but safer).
    pub sync_on_write: bool,
    /// Maximum size of an encoded `history_data` value (bytes).
    pub max_history_bytes: usize,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            sync_on_write: true,
            max_history_bytes: DEFAULT_MAX_HISTORY_BYTES,
        }
    }
}

impl PersistentConfig {
    const MIN_HISTORY_BYTES: usize = 1024;

    /// Check the configuration, returning it unchanged if valid.
    pub fn validate(self) -> Result<Self, QuizError> {
        if self.max_history_bytes < Self::MIN_HISTORY_BYTES {
            return Err(QuizError::config(format!(
                "max_history_bytes must be at least {} bytes (got {})",
                Self::MIN_HISTORY_BYTES,
                self.max_history_bytes
            )));
        }
        Ok(self)
    }
}

/// Open or create a persistent record store at the given path.
///
/// # Errors
/// - If the configuration is invalid
/// - If the path cannot be created or accessed
/// - If another process holds the lock
/// - If the record log is corrupted
pub fn open_record_store(
    path: impl AsRef<Path>,
    config: Option<PersistentConfig>,
) -> Result<PersistentRecordStore, QuizError> {
    let cfg = config.unwrap_or_default().validate()?;
    PersistentRecordStore::open(path.as_ref(), cfg).map_err(|e| {
        QuizError::Persistence(PersistenceError::ConnectionFailed {
            message: e.to_string(),
        })
    })
}

/// Connector opening a [`PersistentRecordStore`] on first use.
#[derive(Debug, Clone)]
pub struct PersistentConnector {
    dir: PathBuf,
    config: PersistentConfig,
}

impl PersistentConnector {
    /// Create a connector for the store in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, config: PersistentConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }
}

impl StoreConnector for PersistentConnector {
    fn connect(&self) -> Result<Arc<dyn RecordStore>, StorageError> {
        let store = PersistentRecordStore::open(&self.dir, self.config.clone())?;
        Ok(Arc::new(store))
    }

    fn describe(&self) -> String {
        format!("file store at {}", self.dir.display())
    }
}

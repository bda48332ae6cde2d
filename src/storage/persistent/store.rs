//! File-backed record store.
//!
//! Wraps an in-memory copy of the table for reads and a [`RecordLog`] for
//! durable writes. The store directory is locked for the lifetime of the
//! store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::info;

use crate::storage::memory::{check_constraints, newest_first, next_submit_time};
use crate::storage::traits::{
    NewRecordRow, RecordRow, RecordStore, StorageError, SubmissionId,
};

use super::file_lock::DirLock;
use super::log::RecordLog;
use super::PersistentConfig;

/// Name of the record log inside a store directory.
pub const LOG_FILE: &str = "records.log";

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Durable record store rooted at a directory.
#[derive(Debug)]
pub struct PersistentRecordStore {
    dir: PathBuf,
    _lock: DirLock,
    log: Mutex<RecordLog>,
    rows: RwLock<Vec<RecordRow>>,
    config: PersistentConfig,
}

impl PersistentRecordStore {
    /// Open or create a store in `dir`.
    ///
    /// # Errors
    /// - `ConnectionError` if the directory cannot be created, another
    ///   process holds the lock, or the log is corrupted
    pub fn open(dir: &Path, config: PersistentConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|e| {
            StorageError::ConnectionError(format!("failed to create store directory: {e}"))
        })?;

        let lock = DirLock::acquire(dir)
            .map_err(|e| StorageError::ConnectionError(format!("failed to acquire lock: {e}")))?;

        let (log, replay) = RecordLog::open(&dir.join(LOG_FILE), config.sync_on_write, config.max_history_bytes)
            .map_err(|e| StorageError::ConnectionError(format!("failed to open record log: {e}")))?;

        info!(
            dir = %dir.display(),
            records = replay.rows.len(),
            trimmed_bytes = replay.trimmed_bytes,
            "record store opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
            log: Mutex::new(log),
            rows: RwLock::new(replay.rows),
            config,
        })
    }

    /// The store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RecordStore for PersistentRecordStore {
    fn insert(&self, row: NewRecordRow) -> Result<RecordRow, StorageError> {
        check_constraints(&row, self.config.max_history_bytes)?;

        // Log first, then publish to readers
        let mut log = self.log.lock().map_err(|_| lock_err("records.log"))?;
        let mut rows = self.rows.write().map_err(|_| lock_err("records.insert"))?;

        let last = rows.iter().map(|r| r.submit_time).max();
        let stored = RecordRow {
            id: SubmissionId::new(),
            user_name: row.user_name,
            answer: row.answer,
            history_data: Some(row.history_data),
            submit_time: next_submit_time(last),
        };

        log.append(&stored)
            .map_err(|e| StorageError::BackendError(format!("failed to append record: {e}")))?;
        rows.push(stored.clone());
        Ok(stored)
    }

    fn select_all(&self) -> Result<Vec<RecordRow>, StorageError> {
        let rows = self.rows.read().map_err(|_| lock_err("records.select_all"))?;
        Ok(newest_first(rows.iter().cloned()))
    }

    fn count(&self) -> Result<usize, StorageError> {
        let rows = self.rows.read().map_err(|_| lock_err("records.count"))?;
        Ok(rows.len())
    }
}

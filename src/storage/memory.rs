//! In-memory record store.
//!
//! Thread-safe, intended for embedded usage, tests, and as a reference
//! implementation of the table's server-side behaviour: id and timestamp
//! assignment, column constraints, descending time order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::storage::traits::{
    NewRecordRow, RecordRow, RecordStore, StorageError, StoreConnector, SubmissionId,
};

/// Default upper bound for an encoded `history_data` value.
///
/// One run encodes to roughly 110 bytes, so this admits sessions of tens of
/// thousands of runs while keeping a log frame well under its 16 MiB cap.
pub const DEFAULT_MAX_HISTORY_BYTES: usize = 4 * 1024 * 1024;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Server-side timestamp for a new row: now, but strictly after `last`.
pub(crate) fn next_submit_time(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match last {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// Column constraints enforced on insert.
pub(crate) fn check_constraints(row: &NewRecordRow, max_history_bytes: usize) -> Result<(), StorageError> {
    if row.user_name.trim().is_empty() {
        return Err(StorageError::ConstraintViolation(
            "user_name must not be empty".to_string(),
        ));
    }
    if row.answer.trim().is_empty() {
        return Err(StorageError::ConstraintViolation(
            "answer must not be empty".to_string(),
        ));
    }
    if row.history_data.len() > max_history_bytes {
        return Err(StorageError::ConstraintViolation(format!(
            "history_data is {} bytes, limit is {max_history_bytes}",
            row.history_data.len()
        )));
    }
    Ok(())
}

/// Orders rows newest first. Rows sharing a timestamp keep later-inserted first.
pub(crate) fn newest_first(rows: impl DoubleEndedIterator<Item = RecordRow>) -> Vec<RecordRow> {
    let mut out: Vec<RecordRow> = rows.rev().collect();
    out.sort_by(|a, b| b.submit_time.cmp(&a.submit_time));
    out
}

/// Thread-safe in-memory record store.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    rows: RwLock<Vec<RecordRow>>,
    max_history_bytes: usize,
    injected_failure: Mutex<Option<StorageError>>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::with_max_history_bytes(DEFAULT_MAX_HISTORY_BYTES)
    }
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a custom `history_data` size limit.
    #[must_use]
    pub fn with_max_history_bytes(max_history_bytes: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            max_history_bytes,
            injected_failure: Mutex::new(None),
        }
    }

    /// Make the next `insert` or `select_all` fail with `error`.
    pub fn fail_next(&self, error: StorageError) {
        if let Ok(mut slot) = self.injected_failure.lock() {
            *slot = Some(error);
        }
    }

    /// Insert a row verbatim, bypassing id/time assignment and constraints.
    ///
    /// Stands in for rows written by other clients of the same table.
    pub fn insert_raw(&self, row: RecordRow) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| lock_err("records.insert_raw"))?;
        if rows.iter().any(|r| r.id == row.id) {
            return Err(StorageError::DuplicateKey(row.id.to_string()));
        }
        rows.push(row);
        Ok(())
    }

    fn take_injected_failure(&self) -> Result<(), StorageError> {
        let mut slot = self
            .injected_failure
            .lock()
            .map_err(|_| lock_err("records.fault"))?;
        match slot.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, row: NewRecordRow) -> Result<RecordRow, StorageError> {
        self.take_injected_failure()?;
        check_constraints(&row, self.max_history_bytes)?;

        let mut rows = self.rows.write().map_err(|_| lock_err("records.insert"))?;
        let last = rows.iter().map(|r| r.submit_time).max();

        let stored = RecordRow {
            id: SubmissionId::new(),
            user_name: row.user_name,
            answer: row.answer,
            history_data: Some(row.history_data),
            submit_time: next_submit_time(last),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    fn select_all(&self) -> Result<Vec<RecordRow>, StorageError> {
        self.take_injected_failure()?;
        let rows = self.rows.read().map_err(|_| lock_err("records.select_all"))?;
        Ok(newest_first(rows.iter().cloned()))
    }

    fn count(&self) -> Result<usize, StorageError> {
        let rows = self.rows.read().map_err(|_| lock_err("records.count"))?;
        Ok(rows.len())
    }
}

/// Connector handing out a shared [`InMemoryRecordStore`].
#[derive(Debug, Default)]
pub struct MemoryConnector {
    store: Arc<InMemoryRecordStore>,
    failing_connects: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemoryConnector {
    /// Create a connector for a fresh empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector for an existing store.
    #[must_use]
    pub fn with_store(store: Arc<InMemoryRecordStore>) -> Self {
        Self {
            store,
            failing_connects: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    /// The store every successful connection points at.
    #[must_use]
    pub fn store(&self) -> Arc<InMemoryRecordStore> {
        Arc::clone(&self.store)
    }

    /// Make the next `n` connection attempts fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.failing_connects.store(n, Ordering::SeqCst);
    }

    /// Number of connection attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl StoreConnector for MemoryConnector {
    fn connect(&self) -> Result<Arc<dyn RecordStore>, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(StorageError::ConnectionError(
                "in-memory store unavailable".to_string(),
            ));
        }
        Ok(self.store())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

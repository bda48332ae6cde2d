//! Record gateway: the only component that talks to the record store.
//!
//! The gateway owns a lazily opened, shared connection. The first operation
//! opens it; if opening fails, or an operation reports that the connection
//! is gone, the next operation simply tries again. There is no internal
//! retry loop.

mod schema;

pub use schema::{decode_history, encode_history};

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::answer::HazardAnswer;
use crate::error::PersistenceError;
use crate::simulation::SimulationResult;
use crate::storage::{
    InMemoryRecordStore, MemoryConnector, NewRecordRow, RecordRow, RecordStore, StorageError,
    StoreConnector, SubmissionId,
};
use crate::submission::SubmissionRecord;

/// A submission as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSubmission {
    /// Store-assigned id.
    pub id: SubmissionId,
    /// Submitter's name.
    pub user_name: String,
    /// Answer label as stored.
    pub answer: String,
    /// Decoded history, oldest first. Empty if the stored value was missing or unreadable.
    pub history: Vec<SimulationResult>,
    /// Store-assigned submission time.
    pub submit_time: DateTime<Utc>,
    /// Set when the stored history could not be decoded.
    pub decode_error: Option<PersistenceError>,
}

impl PersistedSubmission {
    /// Maps a stored row, decoding its history.
    #[must_use]
    pub fn from_row(row: RecordRow) -> Self {
        let (history, decode_error) = match decode_history(row.history_data.as_deref()) {
            Ok(history) => (history, None),
            Err(reason) => {
                warn!(record = %row.id, %reason, "stored history could not be decoded");
                (
                    Vec::new(),
                    Some(PersistenceError::DecodeFailed {
                        record_id: row.id,
                        reason,
                    }),
                )
            }
        };

        Self {
            id: row.id,
            user_name: row.user_name,
            answer: row.answer,
            history,
            submit_time: row.submit_time,
            decode_error,
        }
    }

    /// The stored answer as a hazard, if it names one.
    #[must_use]
    pub fn hazard(&self) -> Option<HazardAnswer> {
        HazardAnswer::parse_label(&self.answer)
    }
}

/// Persistence boundary for submissions.
pub struct RecordGateway {
    connector: Box<dyn StoreConnector>,
    connection: Mutex<Option<Arc<dyn RecordStore>>>,
}

impl fmt::Debug for RecordGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordGateway")
            .field("target", &self.connector.describe())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl RecordGateway {
    /// Create a gateway that connects through `connector` on first use.
    #[must_use]
    pub fn new(connector: impl StoreConnector + 'static) -> Self {
        Self::from_connector(Box::new(connector))
    }

    /// Create a gateway from a boxed connector.
    #[must_use]
    pub fn from_connector(connector: Box<dyn StoreConnector>) -> Self {
        Self {
            connector,
            connection: Mutex::new(None),
        }
    }

    /// Create a gateway backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryConnector::new())
    }

    /// Create a gateway backed by an existing in-memory store.
    #[must_use]
    pub fn with_memory_store(store: Arc<InMemoryRecordStore>) -> Self {
        Self::new(MemoryConnector::with_store(store))
    }

    /// Returns true if a connection is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .map(|conn| conn.is_some())
            .unwrap_or(false)
    }

    fn connection(&self) -> Result<Arc<dyn RecordStore>, PersistenceError> {
        let mut slot = self.connection.lock().map_err(|_| PersistenceError::ConnectionFailed {
            message: "connection slot poisoned".to_string(),
        })?;

        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        match self.connector.connect() {
            Ok(store) => {
                info!(target_store = %self.connector.describe(), "connected to record store");
                *slot = Some(Arc::clone(&store));
                Ok(store)
            }
            Err(e) => {
                warn!(target_store = %self.connector.describe(), error = %e, "record store connection failed");
                Err(PersistenceError::ConnectionFailed {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Translate a store error, dropping the cached connection if it is unusable.
    fn translate(&self, err: StorageError) -> PersistenceError {
        if err.is_connection_level() {
            if let Ok(mut slot) = self.connection.lock() {
                *slot = None;
            }
            return PersistenceError::ConnectionFailed {
                message: err.to_string(),
            };
        }

        match err {
            StorageError::ConstraintViolation(reason)
            | StorageError::DuplicateKey(reason)
            | StorageError::BackendError(reason)
            | StorageError::SerializationError(reason) => PersistenceError::RejectedByStore { reason },
            StorageError::ConnectionError(message) => PersistenceError::ConnectionFailed { message },
            StorageError::Timeout(ms) => PersistenceError::ConnectionFailed {
                message: format!("timed out after {ms}ms"),
            },
        }
    }

    /// Persist a submission, returning the id the store assigned.
    #[instrument(skip_all, fields(user = record.user_name(), answer = %record.answer()))]
    pub fn submit(&self, record: SubmissionRecord) -> Result<SubmissionId, PersistenceError> {
        let (user_name, answer, history) = record.into_parts();
        let entries = history.len();
        let history_data =
            encode_history(&history).map_err(|reason| PersistenceError::EncodeFailed { reason })?;

        let store = self.connection()?;
        let row = store
            .insert(NewRecordRow {
                user_name,
                answer: answer.as_str().to_string(),
                history_data,
            })
            .map_err(|e| self.translate(e))?;

        info!(id = %row.id, entries, submit_time = %row.submit_time, "submission stored");
        Ok(row.id)
    }

    /// Fetch every submission, most recent first.
    ///
    /// A record whose history cannot be decoded is still returned, with an
    /// empty history and `decode_error` set.
    #[instrument(skip_all)]
    pub fn fetch_all(&self) -> Result<Vec<PersistedSubmission>, PersistenceError> {
        let store = self.connection()?;
        let rows = store.select_all().map_err(|e| self.translate(e))?;

        let records: Vec<PersistedSubmission> =
            rows.into_iter().map(PersistedSubmission::from_row).collect();

        let undecodable = records.iter().filter(|r| r.decode_error.is_some()).count();
        if undecodable > 0 {
            warn!(total = records.len(), undecodable, "fetched records with unreadable history");
        }
        Ok(records)
    }

    /// Number of stored submissions.
    pub fn count(&self) -> Result<usize, PersistenceError> {
        let store = self.connection()?;
        store.count().map_err(|e| self.translate(e))
    }
}

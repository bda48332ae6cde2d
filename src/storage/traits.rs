//! Abstract record-store traits for heatquiz.
//!
//! These traits describe the external table that submissions land in:
//!
//! | column         | type                  |
//! |----------------|-----------------------|
//! | `id`           | server-assigned       |
//! | `user_name`    | text                  |
//! | `answer`       | text                  |
//! | `history_data` | text (encoded)        |
//! | `submit_time`  | server-assigned       |
//!
//! Backends deal only in rows. Mapping rows to domain types is the job of
//! [`crate::gateway::RecordGateway`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned identifier of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(uuid::Uuid);

impl SubmissionId {
    /// Creates a new random submission ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during record-store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be reached or initialized.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The store did not answer in time.
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// A table constraint rejected the row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// A stored row could not be read back.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StorageError {
    /// Returns true if the failure means the connection itself is unusable.
    #[must_use]
    pub const fn is_connection_level(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }
}

/// A row to insert. `id` and `submit_time` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecordRow {
    /// Submitter's name, non-blank.
    pub user_name: String,
    /// Answer label.
    pub answer: String,
    /// Encoded history.
    pub history_data: String,
}

/// A row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRow {
    /// Primary key.
    pub id: SubmissionId,
    /// Submitter's name.
    pub user_name: String,
    /// Answer label as written.
    pub answer: String,
    /// Encoded history. Rows written by other clients may lack it.
    #[serde(default)]
    pub history_data: Option<String>,
    /// Insertion time, assigned by the store.
    pub submit_time: DateTime<Utc>,
}

/// Storage trait for submission records.
pub trait RecordStore: Send + Sync {
    /// Insert a row, returning it with its assigned `id` and `submit_time`.
    fn insert(&self, row: NewRecordRow) -> Result<RecordRow, StorageError>;

    /// All rows, ordered by `submit_time` descending.
    fn select_all(&self) -> Result<Vec<RecordRow>, StorageError>;

    /// Number of stored rows.
    fn count(&self) -> Result<usize, StorageError>;
}

/// Opens connections to a record store.
///
/// Each call is an independent attempt; a failed attempt leaves nothing
/// behind, so callers may simply call again.
pub trait StoreConnector: Send + Sync {
    /// Establish a connection.
    fn connect(&self) -> Result<Arc<dyn RecordStore>, StorageError>;

    /// Human-readable description of the target, for logs.
    fn describe(&self) -> String;
}

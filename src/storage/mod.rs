//! Record-store boundary for heatquiz.
//!
//! [`RecordStore`] is the abstract insert/query contract of the external
//! table. Two backends are provided: an in-memory store for tests and
//! embedded use, and a durable file-backed store behind the `persistent`
//! feature.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::{InMemoryRecordStore, MemoryConnector, DEFAULT_MAX_HISTORY_BYTES};
pub use traits::{
    NewRecordRow, RecordRow, RecordStore, StorageError, StoreConnector, SubmissionId,
};

#[cfg(feature = "persistent")]
pub use persistent::{open_record_store, PersistentConfig, PersistentConnector, PersistentRecordStore};

//! # heatquiz - heat-stress running quiz engine
//!
//! The user reads a scenario, tries out environmental conditions, watches
//! the estimated effect on their body, and finally submits an answer. Every
//! run is kept in the session's history; the submit stores the answer
//! together with that history for later review.
//!
//! ## Core Concepts
//!
//! - **SimulationEngine** ([`simulate`]): environmental input to derived metrics, pure
//! - **HistoryStore**: session-scoped, append-only log with a bounded display view
//! - **SubmissionAssembler** ([`assemble`]): name + answer + history snapshot into one record
//! - **RecordGateway**: the only path to durable storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use heatquiz::{EnvironmentalInput, HazardAnswer, QuizSession, RecordGateway};
//!
//! let gateway = RecordGateway::in_memory();
//! let mut session = QuizSession::new();
//!
//! let result = session.run_simulation(EnvironmentalInput::new(40, 20, false));
//! assert_eq!(result.body_temperature, 38.6);
//!
//! let id = session.submit("Lin", HazardAnswer::HeatStroke, &gateway)?;
//! let records = gateway.fetch_all()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod answer;
pub mod error;
pub mod input;
pub mod simulation;

// Session state and submission
pub mod history;
pub mod session;
pub mod submission;

// Persistence
pub mod config;
pub mod gateway;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use answer::{scenario_input, HazardAnswer, SCENARIO_PROMPT};
pub use config::{QuizConfig, StoreBackend, StoreConfig};
pub use error::{PersistenceError, QuizError, QuizResult, ValidationError};
pub use gateway::{PersistedSubmission, RecordGateway};
pub use history::{HistorySnapshot, HistoryStore, DEFAULT_VIEW_LEN};
pub use input::EnvironmentalInput;
pub use session::QuizSession;
pub use simulation::{derive_metrics, simulate, DerivedMetrics, Fixed, SimulationResult};
pub use storage::{
    InMemoryRecordStore, MemoryConnector, RecordStore, StorageError, StoreConnector, SubmissionId,
};
pub use submission::{assemble, SubmissionBuilder, SubmissionRecord};

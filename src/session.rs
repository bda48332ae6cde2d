//! One user's interactive session.
//!
//! A [`QuizSession`] owns the history for its lifetime. Runs append to it;
//! a submit copies it into a record and hands that to the gateway. Dropping
//! the session discards the history; only submitted records outlive it.

use tracing::info;

use crate::error::QuizResult;
use crate::gateway::RecordGateway;
use crate::history::{HistoryStore, DEFAULT_VIEW_LEN};
use crate::input::EnvironmentalInput;
use crate::simulation::{simulate, SimulationResult};
use crate::storage::SubmissionId;
use crate::submission::assemble;

/// Session state: the history log and how much of it to show.
#[derive(Debug, Clone)]
pub struct QuizSession {
    history: HistoryStore,
    view_len: usize,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::with_view_len(DEFAULT_VIEW_LEN)
    }
}

impl QuizSession {
    /// Starts a session with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session that shows the last `view_len` runs.
    #[must_use]
    pub fn with_view_len(view_len: usize) -> Self {
        Self {
            history: HistoryStore::new(),
            view_len,
        }
    }

    /// Runs the simulation and records the result.
    pub fn run_simulation(&mut self, input: EnvironmentalInput) -> SimulationResult {
        let result = simulate(&input);
        self.history.append(result);
        result
    }

    /// The bounded view of recent runs, oldest first.
    #[must_use]
    pub fn recent_history(&self) -> &[SimulationResult] {
        self.history.recent_view(self.view_len)
    }

    /// The full history log.
    #[must_use]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Number of rows shown by [`QuizSession::recent_history`].
    #[must_use]
    pub const fn view_len(&self) -> usize {
        self.view_len
    }

    /// Validates and persists the user's answer together with the full history.
    ///
    /// The history is never truncated. The store caps the encoded size of
    /// `history_data` (`StoreConfig::max_history_bytes`, 4 MiB by default);
    /// a longer history is rejected by the store as a whole.
    ///
    /// # Errors
    /// - `Validation` if the name is blank or the answer unknown; nothing is sent
    /// - `Persistence` if the gateway could not store the record
    pub fn submit(
        &self,
        user_name: &str,
        selected_answer: impl Into<String>,
        gateway: &RecordGateway,
    ) -> QuizResult<SubmissionId> {
        let record = assemble(user_name, selected_answer, &self.history)?;
        let id = gateway.submit(record)?;
        info!(%id, runs = self.history.len(), "answer submitted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::HazardAnswer;
    use crate::error::{QuizError, ValidationError};

    #[test]
    fn test_runs_accumulate_and_view_is_bounded() {
        let mut session = QuizSession::new();
        for t in [20, 25, 30, 35, 40, 40, 25] {
            session.run_simulation(EnvironmentalInput::new(t, 40, true));
        }

        assert_eq!(session.history().len(), 7);
        let temps: Vec<i32> = session.recent_history().iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![30, 35, 40, 40, 25]);
    }

    #[test]
    fn test_custom_view_len() {
        let mut session = QuizSession::with_view_len(2);
        for t in [20, 30, 40] {
            session.run_simulation(EnvironmentalInput::new(t, 40, true));
        }
        assert_eq!(session.recent_history().len(), 2);
        assert_eq!(session.view_len(), 2);
    }

    #[test]
    fn test_invalid_submit_sends_nothing() {
        let session = QuizSession::new();
        let gateway = RecordGateway::in_memory();

        let err = session.submit("   ", HazardAnswer::Dehydration, &gateway).unwrap_err();
        assert!(matches!(err, QuizError::Validation(ValidationError::EmptyUserName)));
        assert!(!gateway.is_connected());
    }

    #[test]
    fn test_submit_with_history() {
        let mut session = QuizSession::new();
        session.run_simulation(EnvironmentalInput::new(40, 20, false));
        let gateway = RecordGateway::in_memory();

        let id = session.submit("Lin", "Heat Stroke", &gateway).unwrap();

        let fetched = gateway.fetch_all().unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, id);
        assert_eq!(fetched[0].history, session.history().snapshot().into_vec());
    }
}

//! Submission assembly.
//!
//! A [`SubmissionRecord`] is built once per submit action from the user's
//! name, their chosen answer and a copy of the session history. It is
//! immutable; correcting an answer means submitting a new record.

use crate::answer::HazardAnswer;
use crate::error::ValidationError;
use crate::history::{HistorySnapshot, HistoryStore};

/// A completed quiz answer, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    user_name: String,
    answer: HazardAnswer,
    history: HistorySnapshot,
}

impl SubmissionRecord {
    /// The submitter's name, trimmed.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// The selected hazard.
    #[must_use]
    pub const fn answer(&self) -> HazardAnswer {
        self.answer
    }

    /// History as it was when the record was assembled.
    #[must_use]
    pub const fn history(&self) -> &HistorySnapshot {
        &self.history
    }

    /// Consumes the record into its parts.
    #[must_use]
    pub fn into_parts(self) -> (String, HazardAnswer, HistorySnapshot) {
        (self.user_name, self.answer, self.history)
    }
}

/// Builder for [`SubmissionRecord`].
///
/// # Example
/// ```rust,ignore
/// let record = SubmissionBuilder::new()
///     .user_name("Lin")
///     .answer(HazardAnswer::Dehydration)
///     .history(session.history())
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SubmissionBuilder {
    user_name: Option<String>,
    answer: Option<String>,
    history: HistorySnapshot,
}

impl SubmissionBuilder {
    /// Creates a builder with an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the submitter's name (required, non-blank).
    #[must_use]
    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    /// Set the selected answer (required). Accepts a [`HazardAnswer`] or any label it parses.
    #[must_use]
    pub fn answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Copy the current contents of `history` into the record.
    #[must_use]
    pub fn history(mut self, history: &HistoryStore) -> Self {
        self.history = history.snapshot();
        self
    }

    /// Use an existing snapshot as the record's history.
    #[must_use]
    pub fn snapshot(mut self, snapshot: HistorySnapshot) -> Self {
        self.history = snapshot;
        self
    }

    /// Build the record.
    ///
    /// Checks run in order and the first failure is returned:
    /// 1. `EmptyUserName` if the name is missing or blank
    /// 2. `InvalidAnswer` if the answer is missing or not a known hazard
    pub fn build(self) -> Result<SubmissionRecord, ValidationError> {
        let user_name = self.user_name.unwrap_or_default();
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(ValidationError::EmptyUserName);
        }

        let raw_answer = self.answer.unwrap_or_default();
        let answer = raw_answer.parse::<HazardAnswer>()?;

        Ok(SubmissionRecord {
            user_name: user_name.to_string(),
            answer,
            history: self.history,
        })
    }
}

/// Assemble a record from a name, an answer label and the session history.
pub fn assemble(
    user_name: &str,
    selected_answer: impl Into<String>,
    history: &HistoryStore,
) -> Result<SubmissionRecord, ValidationError> {
    SubmissionBuilder::new()
        .user_name(user_name)
        .answer(selected_answer)
        .history(history)
        .build()
}

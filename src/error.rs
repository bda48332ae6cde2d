//! Error types for heatquiz.
//!
//! Every failure in the crate is a typed value. Validation errors are
//! raised before anything reaches storage; persistence errors describe what
//! went wrong at the record-store boundary. Nothing here is process-fatal.

use thiserror::Error;

use crate::storage::SubmissionId;

/// Validation errors raised while building inputs or submissions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("User name cannot be empty")]
    EmptyUserName,

    #[error("Invalid answer '{value}': expected one of NoRisk, Dehydration, HeatStroke, HeatExhaustion, Hypothermia")]
    InvalidAnswer {
        value: String,
    },

    #[error("{field} value {value} is out of range [{min}, {max}]")]
    InputOutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Errors reported by the record gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("Connection to record store failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Record store rejected the submission: {reason}")]
    RejectedByStore {
        reason: String,
    },

    #[error("Failed to decode history of record {record_id}: {reason}")]
    DecodeFailed {
        record_id: SubmissionId,
        reason: String,
    },

    #[error("Failed to encode history snapshot: {reason}")]
    EncodeFailed {
        reason: String,
    },
}

impl PersistenceError {
    /// Returns true if re-attempting the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }
}

/// Top-level error type for heatquiz.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },
}

impl QuizError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a persistence error.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Config { .. } => false,
            Self::Persistence(e) => e.is_retryable(),
        }
    }
}

/// Result type alias for heatquiz operations.
pub type QuizResult<T> = Result<T, QuizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        assert!(ValidationError::EmptyUserName.to_string().contains("empty"));

        let err = ValidationError::InvalidAnswer {
            value: "sunburn".to_string(),
        };
        assert!(err.to_string().contains("sunburn"));

        let err = ValidationError::InputOutOfRange {
            field: "temperature",
            value: 55,
            min: 20,
            max: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("temperature"));
        assert!(msg.contains("55"));
        assert!(msg.contains("[20, 40]"));
    }

    #[test]
    fn test_persistence_error_messages() {
        let err = PersistenceError::RejectedByStore {
            reason: "user_name violates not-null".to_string(),
        };
        assert!(err.to_string().contains("not-null"));

        let id = SubmissionId::new();
        let err = PersistenceError::DecodeFailed {
            record_id: id,
            reason: "expected array".to_string(),
        };
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_quiz_error_from_validation() {
        let err: QuizError = ValidationError::EmptyUserName.into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_quiz_error_retryable() {
        let err: QuizError = PersistenceError::ConnectionFailed {
            message: "refused".to_string(),
        }
        .into();
        assert!(err.is_persistence());
        assert!(err.is_retryable());

        let err: QuizError = PersistenceError::RejectedByStore {
            reason: "constraint".to_string(),
        }
        .into();
        assert!(!err.is_retryable());

        assert!(!QuizError::config("bad").is_retryable());
    }
}

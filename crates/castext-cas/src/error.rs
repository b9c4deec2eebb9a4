//! Evaluator error types.

use thiserror::Error;

/// Errors an evaluator reports for a single expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CasError {
    /// The expression was rejected before evaluation.
    #[error("{message}")]
    Syntax {
        message: String,
        /// A corrected expression the author may have meant.
        suggestion: Option<String>,
    },

    /// Evaluation started and failed.
    #[error("{message}")]
    Runtime { message: String },
}

impl CasError {
    /// A syntax error without a suggestion.
    pub fn syntax(message: impl Into<String>) -> Self {
        CasError::Syntax {
            message: message.into(),
            suggestion: None,
        }
    }

    /// A runtime error.
    pub fn runtime(message: impl Into<String>) -> Self {
        CasError::Runtime {
            message: message.into(),
        }
    }

    /// Attach a corrective suggestion to a syntax error.
    ///
    /// Runtime errors are returned unchanged.
    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        match self {
            CasError::Syntax { message, .. } => CasError::Syntax {
                message,
                suggestion: Some(suggestion.into()),
            },
            other => other,
        }
    }

    /// Whether this is a syntax error.
    pub fn is_syntax(&self) -> bool {
        matches!(self, CasError::Syntax { .. })
    }
}

/// Result type for evaluator operations.
pub type CasResult<T> = Result<T, CasError>;

/// An unrecognised render option value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {option} `{value}` (expected one of: {expected})")]
pub struct InvalidOption {
    pub option: &'static str,
    pub value: String,
    pub expected: &'static str,
}

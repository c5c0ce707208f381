//! Error taxonomy for quiz sessions and result storage.
//!
//! `QuizError` is what the session and question bank return to a driver;
//! `StoreError` is what a `ResultStore` backend returns and is carried
//! inside `QuizError::Storage` when a session write fails.

use thiserror::Error;

use crate::session::SessionState;

/// Errors raised by the question bank and the attempt session.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The question source is missing, malformed, or inconsistent.
    #[error("failed to load questions: {0}")]
    Load(String),

    /// A question index outside `[0, size)` was requested.
    #[error("question index {index} out of range (bank has {size} questions)")]
    Index { index: usize, size: usize },

    /// User input was rejected; the session did not change.
    #[error("invalid input: {0}")]
    Validation(String),

    /// An operation was invoked in a state that does not allow it.
    #[error("cannot {operation} while the attempt is {state}")]
    State {
        operation: &'static str,
        state: SessionState,
    },

    /// An answer arrived after the time budget ran out.
    #[error("time limit reached, answer was not recorded")]
    TimeExpired,

    /// A record could not be written or read back.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl QuizError {
    /// Returns `true` if the driver can recover by prompting again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuizError::Validation(_) | QuizError::Storage(_))
    }
}

/// Errors raised by `ResultStore` backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file I/O failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be encoded or decoded.
    #[error("malformed table {table}: {message}")]
    Format { table: &'static str, message: String },

    /// A backend refused the write (used by test doubles).
    #[error("write rejected: {0}")]
    Rejected(String),
}

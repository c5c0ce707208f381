//! Seams between the attempt session and its collaborators.
//!
//! `ResultStore` is implemented by the `quizkit-store` crate; `Clock` by
//! `crate::clock`.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{AnswerRecord, AttemptSummary};

// ---------------------------------------------------------------------------
// Result store
// ---------------------------------------------------------------------------

/// Append-only log of answer records and attempt summaries.
///
/// Writes are single-writer per process and are never retried by callers.
pub trait ResultStore: Send + Sync {
    /// Human-readable backend name (e.g. "csv").
    fn name(&self) -> &str;

    /// Append one answer record.
    fn append_answer(&self, record: &AnswerRecord) -> Result<(), StoreError>;

    /// Append one attempt summary.
    fn append_summary(&self, summary: &AttemptSummary) -> Result<(), StoreError>;

    /// Every summary written so far, in write order.
    ///
    /// Returns an empty list when nothing has been written yet.
    fn read_all_summaries(&self) -> Result<Vec<AttemptSummary>, StoreError>;

    /// Every answer record written so far, in write order.
    fn read_all_answers(&self) -> Result<Vec<AnswerRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current time for timers and record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

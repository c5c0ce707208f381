//! In-memory result store for tests and dry runs.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use quizkit_core::error::StoreError;
use quizkit_core::model::{AnswerRecord, AttemptSummary};
use quizkit_core::traits::ResultStore;

/// A result store that keeps rows in memory.
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    answers: Mutex<Vec<AnswerRecord>>,
    summaries: Mutex<Vec<AttemptSummary>>,
    fail_writes: AtomicBool,
    write_count: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with summaries, e.g. for dashboard tests.
    pub fn with_summaries(summaries: Vec<AttemptSummary>) -> Self {
        Self {
            summaries: Mutex::new(summaries),
            ..Self::default()
        }
    }

    /// Make every later write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of write attempts, successful or not.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            Err(StoreError::Rejected("memory store is read-only".into()))
        } else {
            Ok(())
        }
    }
}

impl ResultStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn append_answer(&self, record: &AnswerRecord) -> Result<(), StoreError> {
        self.check_write()?;
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn append_summary(&self, summary: &AttemptSummary) -> Result<(), StoreError> {
        self.check_write()?;
        self.summaries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(summary.clone());
        Ok(())
    }

    fn read_all_summaries(&self) -> Result<Vec<AttemptSummary>, StoreError> {
        Ok(self
            .summaries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn read_all_answers(&self) -> Result<Vec<AnswerRecord>, StoreError> {
        Ok(self
            .answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use quizkit_core::bank::QuestionBank;
    use quizkit_core::clock::ManualClock;
    use quizkit_core::dashboard::load_dashboard;
    use quizkit_core::error::QuizError;
    use quizkit_core::session::{AttemptSession, SessionState};

    fn session(clock: Arc<ManualClock>) -> AttemptSession {
        AttemptSession::new(
            Arc::new(QuestionBank::default_set()),
            clock,
            Duration::minutes(30),
        )
    }

    #[test]
    fn full_attempt_feeds_dashboard() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ));
        let store = MemoryStore::new();

        assert!(load_dashboard(&store).unwrap().is_empty());

        let mut s = session(clock.clone());
        s.start("Ada").unwrap();
        for choice in ["Paris", "Mars", "Giraffe", "Leonardo da Vinci", "Ag"] {
            clock.advance(Duration::seconds(30));
            s.submit_answer(choice, &store).unwrap();
        }
        s.finalize(&store).unwrap();
        s.finalize(&store).unwrap();

        s.reset();
        s.start("Bob").unwrap();
        clock.advance(Duration::minutes(31));
        assert_eq!(s.tick(), SessionState::Completed);
        s.finalize(&store).unwrap();

        assert_eq!(store.read_all_answers().unwrap().len(), 5);
        let view = load_dashboard(&store).unwrap();
        assert_eq!(view.attempt_count, 2);
        assert_eq!(view.recent[0].taker_name, "Bob");
        assert_eq!(view.recent[0].score, 0);
        assert_eq!(view.recent[1].score, 3);
        assert_eq!(view.series.len(), 2);
    }

    #[test]
    fn preloaded_summaries_feed_dashboard() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let summary = |offset: i64, name: &str, score: u32| AttemptSummary {
            timestamp: at + Duration::minutes(offset),
            taker_name: name.into(),
            score,
            total_questions: 5,
            time_taken: "2m 0s".into(),
            completed: true,
            attempt_key: None,
        };
        let store = MemoryStore::with_summaries(vec![summary(10, "Lin", 4), summary(0, "Ada", 2)]);

        assert_eq!(store.write_count(), 0);
        let view = load_dashboard(&store).unwrap();
        assert_eq!(view.attempt_count, 2);
        assert_eq!(view.recent[0].taker_name, "Lin");
        assert_eq!(view.series[0].score, 2);
        assert!(store.read_all_answers().unwrap().is_empty());
    }

    #[test]
    fn failing_writes_surface_as_storage_errors() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        let mut s = session(clock);
        s.start("Ada").unwrap();
        let err = s.submit_answer("Paris", &store).unwrap_err();
        assert!(matches!(err, QuizError::Storage(StoreError::Rejected(_))));
        assert_eq!(s.current_index(), 1);
        assert_eq!(store.write_count(), 1);
        assert!(store.read_all_answers().unwrap().is_empty());
    }
}

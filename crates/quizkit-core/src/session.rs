//! The timed attempt state machine.
//!
//! One `AttemptSession` drives one taker through the question bank:
//!
//! ```text
//! NotStarted --start--> InProgress --last answer / timer--> Completed
//!      ^                                                        |
//!      +------------------------- reset ------------------------+
//! ```
//!
//! Drivers re-evaluate the session on every render, so `tick` and
//! `finalize` are safe to call repeatedly: a timer expiry completes the
//! attempt once, and the summary is written at most once.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::model::{
    format_countdown, format_time_taken, percentage, AnswerRecord, AttemptKey, AttemptSummary,
    FeedbackTier, Question,
};
use crate::traits::{Clock, ResultStore};

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::Completed => write!(f, "completed"),
        }
    }
}

/// What happened to one submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub record: AnswerRecord,
    /// `true` if this answer finished the attempt.
    pub completed: bool,
}

/// The figures shown on a results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub taker_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: f64,
    pub tier: FeedbackTier,
    pub time_taken: String,
    /// `true` if the timer ended the attempt.
    pub timed_out: bool,
}

/// One taker's run through the question bank.
pub struct AttemptSession {
    bank: Arc<QuestionBank>,
    clock: Arc<dyn Clock>,
    time_limit: Duration,
    state: SessionState,
    taker_name: String,
    attempt_key: Option<AttemptKey>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    current_index: usize,
    score: u32,
    timed_out: bool,
    results_persisted: bool,
}

impl fmt::Debug for AttemptSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptSession")
            .field("state", &self.state)
            .field("taker_name", &self.taker_name)
            .field("attempt_key", &self.attempt_key)
            .field("current_index", &self.current_index)
            .field("score", &self.score)
            .field("results_persisted", &self.results_persisted)
            .finish_non_exhaustive()
    }
}

impl AttemptSession {
    /// Create a session in `NotStarted`.
    pub fn new(bank: Arc<QuestionBank>, clock: Arc<dyn Clock>, time_limit: Duration) -> Self {
        Self {
            bank,
            clock,
            time_limit,
            state: SessionState::NotStarted,
            taker_name: String::new(),
            attempt_key: None,
            started_at: None,
            ended_at: None,
            current_index: 0,
            score: 0,
            timed_out: false,
            results_persisted: false,
        }
    }

    /// Begin an attempt for `name`.
    pub fn start(&mut self, name: &str) -> Result<(), QuizError> {
        self.require(SessionState::NotStarted, "start a new attempt")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(QuizError::Validation(
                "please enter your name to start the quiz".into(),
            ));
        }

        let now = self.clock.now();
        self.taker_name = name.to_string();
        self.attempt_key = Some(AttemptKey::generate(name, now));
        self.started_at = Some(now);
        self.ended_at = None;
        self.current_index = 0;
        self.score = 0;
        self.timed_out = false;
        self.results_persisted = false;
        self.state = SessionState::InProgress;

        tracing::info!(
            taker = %self.taker_name,
            questions = self.bank.size(),
            limit_secs = self.time_limit.num_seconds(),
            "attempt started"
        );
        Ok(())
    }

    /// Time left before the attempt is force-completed.
    pub fn remaining_time(&self) -> Result<Duration, QuizError> {
        self.require(SessionState::InProgress, "read the remaining time")?;
        Ok(self.remaining_at(self.clock.now()))
    }

    /// Check the timer; completes the attempt if the budget is spent.
    ///
    /// Returns the state after the check. Outside `InProgress` this does
    /// nothing.
    pub fn tick(&mut self) -> SessionState {
        if self.state == SessionState::InProgress {
            let now = self.clock.now();
            if self.remaining_at(now) <= Duration::zero() {
                self.timed_out = true;
                self.complete(now);
                tracing::info!(
                    taker = %self.taker_name,
                    answered = self.current_index,
                    score = self.score,
                    "time limit reached"
                );
            }
        }
        self.state
    }

    /// Record the taker's choice for the current question.
    ///
    /// The in-memory transition is committed before the record is
    /// written, so a `QuizError::Storage` result means the attempt moved
    /// on but this answer row may be missing from the store.
    pub fn submit_answer(
        &mut self,
        choice: &str,
        store: &dyn ResultStore,
    ) -> Result<AnswerOutcome, QuizError> {
        if self.state == SessionState::InProgress && self.tick() == SessionState::Completed {
            return Err(QuizError::TimeExpired);
        }
        self.require(SessionState::InProgress, "submit an answer")?;

        let question = self.bank.at(self.current_index)?;
        let is_correct = question.is_correct(choice);
        let record = AnswerRecord {
            attempt_key: self.key()?.clone(),
            question_id: question.id,
            chosen_answer: choice.to_string(),
            is_correct,
            timestamp: self.clock.now(),
        };

        if is_correct {
            self.score += 1;
        }
        self.current_index += 1;
        let completed = self.current_index >= self.bank.size();
        if completed {
            self.complete(record.timestamp);
        }

        tracing::debug!(
            question_id = record.question_id,
            correct = is_correct,
            "answer recorded"
        );

        store.append_answer(&record).map_err(|e| {
            tracing::warn!(error = %e, question_id = record.question_id, "failed to save answer");
            QuizError::Storage(e)
        })?;

        Ok(AnswerOutcome { record, completed })
    }

    /// Write the attempt summary if it has not been written yet.
    ///
    /// Returns the summary on the call that writes it and `None` on every
    /// later call. A failed write is not retried.
    pub fn finalize(
        &mut self,
        store: &dyn ResultStore,
    ) -> Result<Option<AttemptSummary>, QuizError> {
        self.require(SessionState::Completed, "finalize the attempt")?;
        if self.results_persisted {
            return Ok(None);
        }

        let summary = AttemptSummary {
            timestamp: self.clock.now(),
            taker_name: self.taker_name.clone(),
            score: self.score,
            total_questions: self.total_questions(),
            time_taken: format_time_taken(self.time_taken()),
            completed: true,
            attempt_key: self.attempt_key.clone(),
        };
        self.results_persisted = true;

        store.append_summary(&summary).map_err(|e| {
            tracing::warn!(error = %e, taker = %summary.taker_name, "failed to save attempt");
            QuizError::Storage(e)
        })?;

        tracing::info!(
            taker = %summary.taker_name,
            score = summary.score,
            total = summary.total_questions,
            time_taken = %summary.time_taken,
            "attempt saved"
        );
        Ok(Some(summary))
    }

    /// Discard the attempt and return to `NotStarted`.
    pub fn reset(&mut self) {
        self.state = SessionState::NotStarted;
        self.taker_name.clear();
        self.attempt_key = None;
        self.started_at = None;
        self.ended_at = None;
        self.current_index = 0;
        self.score = 0;
        self.timed_out = false;
        self.results_persisted = false;
    }

    // -- read side --------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn taker_name(&self) -> &str {
        &self.taker_name
    }

    pub fn attempt_key(&self) -> Option<&AttemptKey> {
        self.attempt_key.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> u32 {
        u32::try_from(self.bank.size()).unwrap_or(u32::MAX)
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn results_persisted(&self) -> bool {
        self.results_persisted
    }

    /// `true` if the timer, not the last answer, ended the attempt.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// The question awaiting an answer, if the attempt is in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            SessionState::InProgress => self.bank.at(self.current_index).ok(),
            _ => None,
        }
    }

    /// Fraction of the quiz reached, counting the question on screen.
    pub fn progress(&self) -> f64 {
        let total = self.bank.size();
        if total == 0 {
            return 0.0;
        }
        ((self.current_index + 1).min(total) as f64) / total as f64
    }

    /// Remaining time as `"MM:SS"`.
    pub fn countdown(&self) -> Result<String, QuizError> {
        self.remaining_time().map(format_countdown)
    }

    /// Elapsed time, clamped to the time limit.
    ///
    /// Measured to the moment of completion once the attempt is over.
    pub fn time_taken(&self) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::zero();
        };
        let end = self.ended_at.unwrap_or_else(|| self.clock.now());
        (end - started).clamp(Duration::zero(), self.time_limit)
    }

    /// Results-page figures for a completed attempt.
    pub fn outcome(&self) -> Result<AttemptOutcome, QuizError> {
        self.require(SessionState::Completed, "show results")?;
        let total = self.total_questions();
        let pct = percentage(self.score, total);
        Ok(AttemptOutcome {
            taker_name: self.taker_name.clone(),
            score: self.score,
            total_questions: total,
            percentage: pct,
            tier: FeedbackTier::for_percentage(pct),
            time_taken: format_time_taken(self.time_taken()),
            timed_out: self.timed_out,
        })
    }

    // -- internals --------------------------------------------------------

    fn require(&self, state: SessionState, operation: &'static str) -> Result<(), QuizError> {
        if self.state == state {
            Ok(())
        } else {
            Err(QuizError::State {
                operation,
                state: self.state,
            })
        }
    }

    fn key(&self) -> Result<&AttemptKey, QuizError> {
        self.attempt_key.as_ref().ok_or(QuizError::State {
            operation: "submit an answer",
            state: self.state,
        })
    }

    fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = self
            .started_at
            .map(|s| now - s)
            .unwrap_or_else(Duration::zero);
        (self.time_limit - elapsed).max(Duration::zero())
    }

    fn complete(&mut self, at: DateTime<Utc>) {
        self.state = SessionState::Completed;
        self.ended_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Records everything written; optionally fails every write.
    #[derive(Default)]
    struct RecordingStore {
        answers: Mutex<Vec<AnswerRecord>>,
        summaries: Mutex<Vec<AttemptSummary>>,
        fail_writes: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Default::default()
            }
        }

        fn answers(&self) -> Vec<AnswerRecord> {
            self.answers.lock().unwrap().clone()
        }

        fn summaries(&self) -> Vec<AttemptSummary> {
            self.summaries.lock().unwrap().clone()
        }
    }

    impl ResultStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        fn append_answer(&self, record: &AnswerRecord) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Rejected("disk full".into()));
            }
            self.answers.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn append_summary(&self, summary: &AttemptSummary) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Rejected("disk full".into()));
            }
            self.summaries.lock().unwrap().push(summary.clone());
            Ok(())
        }

        fn read_all_summaries(&self) -> Result<Vec<AttemptSummary>, StoreError> {
            Ok(self.summaries())
        }

        fn read_all_answers(&self) -> Result<Vec<AnswerRecord>, StoreError> {
            Ok(self.answers())
        }
    }

    fn setup() -> (Arc<ManualClock>, AttemptSession) {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let session = AttemptSession::new(
            Arc::new(QuestionBank::default_set()),
            clock.clone(),
            Duration::minutes(30),
        );
        (clock, session)
    }

    const CORRECT: [&str; 5] = ["Paris", "Mars", "Blue Whale", "Leonardo da Vinci", "Au"];

    #[test]
    fn start_sets_full_time_budget() {
        let (_clock, mut session) = setup();
        session.start("Ada").unwrap();
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.remaining_time().unwrap(), Duration::minutes(30));
        assert_eq!(session.countdown().unwrap(), "30:00");
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn start_rejects_empty_name_without_changing_state() {
        let (_clock, mut session) = setup();
        assert!(matches!(session.start(""), Err(QuizError::Validation(_))));
        assert!(matches!(session.start("   "), Err(QuizError::Validation(_))));
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(session.attempt_key().is_none());
    }

    #[test]
    fn start_twice_is_a_state_error() {
        let (_clock, mut session) = setup();
        session.start("Ada").unwrap();
        assert!(matches!(
            session.start("Bob"),
            Err(QuizError::State {
                state: SessionState::InProgress,
                ..
            })
        ));
        assert_eq!(session.taker_name(), "Ada");
    }

    #[test]
    fn three_right_two_wrong_scores_three() {
        let (clock, mut session) = setup();
        let store = RecordingStore::default();
        session.start("Ada").unwrap();

        let choices = ["Paris", "Venus", "Blue Whale", "Michelangelo", "Au"];
        for (i, choice) in choices.iter().enumerate() {
            clock.advance(Duration::seconds(20));
            let outcome = session.submit_answer(choice, &store).unwrap();
            assert_eq!(outcome.completed, i == choices.len() - 1);
        }

        assert_eq!(session.state(), SessionState::Completed);
        let summary = session.finalize(&store).unwrap().unwrap();
        assert_eq!(summary.score, 3);
        assert_eq!(summary.total_questions, 5);
        assert!(summary.completed);
        assert_eq!(summary.time_taken, "1m 40s");
        assert_eq!(summary.attempt_key.as_ref(), session.attempt_key());

        let answers = store.answers();
        assert_eq!(answers.len(), 5);
        assert_eq!(answers.iter().filter(|a| a.is_correct).count(), 3);
        assert!(answers
            .iter()
            .all(|a| Some(&a.attempt_key) == session.attempt_key()));
        assert_eq!(
            answers.iter().map(|a| a.question_id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );

        let outcome = session.outcome().unwrap();
        assert!((outcome.percentage - 60.0).abs() < f64::EPSILON);
        assert_eq!(outcome.tier, FeedbackTier::Good);
        assert!(!outcome.timed_out);
    }

    #[test]
    fn ticks_between_answers_do_not_change_score() {
        let (clock, mut session) = setup();
        let store = RecordingStore::default();
        session.start("Ada").unwrap();

        for choice in CORRECT {
            for _ in 0..3 {
                assert_eq!(session.tick(), SessionState::InProgress);
                clock.advance(Duration::seconds(1));
            }
            session.submit_answer(choice, &store).unwrap();
        }
        assert_eq!(session.tick(), SessionState::Completed);
        assert_eq!(session.score(), 5);
    }

    #[test]
    fn timer_expiry_forces_completion_with_zero_score() {
        let (clock, mut session) = setup();
        let store = RecordingStore::default();
        session.start("Ada").unwrap();

        clock.advance(Duration::minutes(30) + Duration::seconds(1));
        assert_eq!(session.tick(), SessionState::Completed);
        assert!(session.timed_out());
        assert_eq!(session.score(), 0);
        assert!(session.current_index() < QuestionBank::default_set().size());

        let summary = session.finalize(&store).unwrap().unwrap();
        assert_eq!(summary.score, 0);
        assert_eq!(summary.time_taken, "30m 0s");
        assert!(store.answers().is_empty());
    }

    #[test]
    fn tick_is_idempotent_after_expiry() {
        let (clock, mut session) = setup();
        session.start("Ada").unwrap();
        clock.advance(Duration::minutes(45));
        assert_eq!(session.tick(), SessionState::Completed);
        assert_eq!(session.tick(), SessionState::Completed);
        assert_eq!(session.time_taken(), Duration::minutes(30));
    }

    #[test]
    fn answer_after_expiry_is_rejected() {
        let (clock, mut session) = setup();
        let store = RecordingStore::default();
        session.start("Ada").unwrap();
        session.submit_answer("Paris", &store).unwrap();

        clock.advance(Duration::minutes(31));
        assert!(matches!(
            session.submit_answer("Mars", &store),
            Err(QuizError::TimeExpired)
        ));
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.score(), 1);
        assert_eq!(store.answers().len(), 1);
    }

    #[test]
    fn remaining_time_counts_down_and_floors_at_zero() {
        let (clock, mut session) = setup();
        session.start("Ada").unwrap();
        clock.advance(Duration::seconds(65));
        assert_eq!(
            session.remaining_time().unwrap(),
            Duration::minutes(30) - Duration::seconds(65)
        );
        assert_eq!(session.countdown().unwrap(), "28:55");

        clock.advance(Duration::hours(2));
        assert_eq!(session.remaining_time().unwrap(), Duration::zero());
    }

    #[test]
    fn finalize_writes_exactly_once() {
        let (_clock, mut session) = setup();
        let store = RecordingStore::default();
        session.start("Ada").unwrap();
        for choice in CORRECT {
            session.submit_answer(choice, &store).unwrap();
        }

        assert!(session.finalize(&store).unwrap().is_some());
        for _ in 0..10 {
            assert!(session.finalize(&store).unwrap().is_none());
        }
        assert_eq!(store.summaries().len(), 1);
        assert!(session.results_persisted());
    }

    #[test]
    fn finalize_before_completion_is_a_state_error() {
        let (_clock, mut session) = setup();
        let store = RecordingStore::default();
        assert!(matches!(
            session.finalize(&store),
            Err(QuizError::State { .. })
        ));
        session.start("Ada").unwrap();
        assert!(matches!(
            session.finalize(&store),
            Err(QuizError::State {
                state: SessionState::InProgress,
                ..
            })
        ));
        assert!(store.summaries().is_empty());
    }

    #[test]
    fn submit_outside_in_progress_is_a_state_error() {
        let (_clock, mut session) = setup();
        let store = RecordingStore::default();
        assert!(matches!(
            session.submit_answer("Paris", &store),
            Err(QuizError::State {
                state: SessionState::NotStarted,
                ..
            })
        ));

        session.start("Ada").unwrap();
        for choice in CORRECT {
            session.submit_answer(choice, &store).unwrap();
        }
        assert!(matches!(
            session.submit_answer("Paris", &store),
            Err(QuizError::State {
                state: SessionState::Completed,
                ..
            })
        ));
        assert_eq!(session.score(), 5);
        assert_eq!(store.answers().len(), 5);
    }

    #[test]
    fn failed_answer_write_still_advances() {
        let (_clock, mut session) = setup();
        let store = RecordingStore::failing();
        session.start("Ada").unwrap();

        let err = session.submit_answer("Paris", &store).unwrap_err();
        assert!(matches!(err, QuizError::Storage(_)));
        assert!(err.is_recoverable());
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn failed_summary_write_is_not_retried() {
        let (clock, mut session) = setup();
        let store = RecordingStore::failing();
        session.start("Ada").unwrap();
        clock.advance(Duration::hours(1));
        session.tick();

        assert!(matches!(
            session.finalize(&store),
            Err(QuizError::Storage(_))
        ));
        assert!(session.results_persisted());
        assert!(session.finalize(&store).unwrap().is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let (_clock, mut session) = setup();
        let store = RecordingStore::default();
        session.start("Ada").unwrap();
        session.submit_answer("Paris", &store).unwrap();

        session.reset();
        assert_eq!(session.state(), SessionState::NotStarted);
        assert_eq!(session.taker_name(), "");
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_index(), 0);
        assert!(session.attempt_key().is_none());
        assert!(!session.results_persisted());
        assert!(session.remaining_time().is_err());

        session.start("Bob").unwrap();
        assert_eq!(session.taker_name(), "Bob");
    }

    #[test]
    fn current_question_and_progress_follow_index() {
        let (_clock, mut session) = setup();
        let store = RecordingStore::default();
        assert!(session.current_question().is_none());

        session.start("Ada").unwrap();
        assert_eq!(session.current_question().unwrap().id, 1);
        assert!((session.progress() - 0.2).abs() < f64::EPSILON);

        session.submit_answer("Paris", &store).unwrap();
        assert_eq!(session.current_question().unwrap().id, 2);
        assert!((session.progress() - 0.4).abs() < f64::EPSILON);
    }
}

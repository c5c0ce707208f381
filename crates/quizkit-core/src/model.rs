//! Core data model types for quizkit.
//!
//! Questions are immutable once loaded. Answer records and attempt
//! summaries are the two kinds of row a session emits to a `ResultStore`.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier, unique within the bank.
    pub id: i64,
    /// The question text shown to the taker.
    pub text: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// The option that scores a point.
    pub correct_answer: String,
}

impl Question {
    /// Returns `true` if `choice` is exactly the correct answer.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.correct_answer
    }
}

/// Correlates the answer records of one attempt with its summary.
///
/// Built from the taker's name, the start time in whole seconds, and a
/// random suffix so two takers with the same name starting in the same
/// second still get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptKey(String);

impl AttemptKey {
    /// Generate a fresh key for an attempt started at `started_at`.
    pub fn generate(name: &str, started_at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{name}_{}_{}", started_at.timestamp(), &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AttemptKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for AttemptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub attempt_key: AttemptKey,
    pub question_id: i64,
    pub chosen_answer: String,
    pub is_correct: bool,
    pub timestamp: DateTime<Utc>,
}

/// The summary row written once per finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    /// When the attempt was finalized.
    pub timestamp: DateTime<Utc>,
    pub taker_name: String,
    pub score: u32,
    pub total_questions: u32,
    /// Formatted as `"<m>m <s>s"`.
    pub time_taken: String,
    pub completed: bool,
    /// Absent on rows written before attempt keys were stored.
    #[serde(default)]
    pub attempt_key: Option<AttemptKey>,
}

impl AttemptSummary {
    /// Score as a percentage of the question count.
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_questions)
    }
}

/// Score as a percentage; zero when there are no questions.
pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(score) / f64::from(total) * 100.0
    }
}

/// Format an elapsed duration as `"<m>m <s>s"`, truncating to whole seconds.
pub fn format_time_taken(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Format a remaining duration as a `"MM:SS"` countdown.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Qualitative feedback shown with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    Excellent,
    Good,
    KeepPracticing,
}

impl FeedbackTier {
    /// Pick the tier for a percentage score.
    pub fn for_percentage(pct: f64) -> Self {
        if pct >= 80.0 {
            FeedbackTier::Excellent
        } else if pct >= 60.0 {
            FeedbackTier::Good
        } else {
            FeedbackTier::KeepPracticing
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            FeedbackTier::Excellent => "Excellent!",
            FeedbackTier::Good => "Good Job!",
            FeedbackTier::KeepPracticing => "Keep Practicing!",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FeedbackTier::Excellent => "You've demonstrated outstanding knowledge!",
            FeedbackTier::Good => "You've shown good understanding of the material.",
            FeedbackTier::KeepPracticing => {
                "You might want to review the material and try again."
            }
        }
    }
}

impl fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

//! Aggregate views over stored attempt summaries for the admin dashboard.
//!
//! Everything here is a pure function of the summaries passed in; callers
//! re-read the store on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::AttemptSummary;
use crate::traits::ResultStore;

/// How many attempts the recent-attempts table shows.
pub const RECENT_ATTEMPTS: usize = 10;

/// Number of attempts that reached a given score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub score: u32,
    pub count: usize,
}

/// One point of the score-over-time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub timestamp: DateTime<Utc>,
    pub score: u32,
}

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardView {
    pub attempt_count: usize,
    pub mean_score: f64,
    pub mean_percentage: f64,
    /// Ascending by score; only scores that occurred.
    pub histogram: Vec<ScoreBucket>,
    /// Ascending by timestamp.
    pub series: Vec<ScorePoint>,
    /// Newest first, at most `RECENT_ATTEMPTS`.
    pub recent: Vec<AttemptSummary>,
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.attempt_count == 0
    }
}

/// Read every summary from `store` and aggregate it.
pub fn load_dashboard(store: &dyn ResultStore) -> Result<DashboardView, StoreError> {
    let summaries = store.read_all_summaries()?;
    tracing::debug!(backend = store.name(), attempts = summaries.len(), "dashboard loaded");
    Ok(compute_dashboard(&summaries))
}

/// Aggregate a set of summaries.
pub fn compute_dashboard(summaries: &[AttemptSummary]) -> DashboardView {
    if summaries.is_empty() {
        return DashboardView::default();
    }

    let n = summaries.len() as f64;
    let mean_score = summaries.iter().map(|s| f64::from(s.score)).sum::<f64>() / n;
    let mean_percentage = summaries.iter().map(AttemptSummary::percentage).sum::<f64>() / n;

    DashboardView {
        attempt_count: summaries.len(),
        mean_score,
        mean_percentage,
        histogram: score_histogram(summaries),
        series: score_series(summaries),
        recent: recent_attempts(summaries, RECENT_ATTEMPTS),
    }
}

/// Count attempts per distinct score.
pub fn score_histogram(summaries: &[AttemptSummary]) -> Vec<ScoreBucket> {
    let mut counts = std::collections::BTreeMap::new();
    for s in summaries {
        *counts.entry(s.score).or_insert(0usize) += 1;
    }
    counts
        .into_iter()
        .map(|(score, count)| ScoreBucket { score, count })
        .collect()
}

/// Scores in time order. Attempts with equal timestamps keep write order.
pub fn score_series(summaries: &[AttemptSummary]) -> Vec<ScorePoint> {
    let mut points: Vec<ScorePoint> = summaries
        .iter()
        .map(|s| ScorePoint {
            timestamp: s.timestamp,
            score: s.score,
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// The `limit` newest attempts, newest first.
pub fn recent_attempts(summaries: &[AttemptSummary], limit: usize) -> Vec<AttemptSummary> {
    let mut sorted: Vec<&AttemptSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.into_iter().take(limit).cloned().collect()
}

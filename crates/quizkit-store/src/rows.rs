//! On-disk row layouts for the three CSV tables.
//!
//! Column names are fixed so existing data files keep working:
//!
//! - attempts: `timestamp,name,score,total_questions,time_taken,completed[,attempt_id]`
//! - answers: `attempt_id,question_id,answer,correct,timestamp`
//!
//! Booleans are written as `True`/`False` and timestamps as RFC 3339 UTC.
//! Older files may hold naive ISO-8601 timestamps, read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use quizkit_core::model::{AnswerRecord, AttemptKey, AttemptSummary};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AttemptRow {
    #[serde(with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub score: u32,
    pub total_questions: u32,
    pub time_taken: String,
    #[serde(with = "py_bool")]
    pub completed: bool,
    #[serde(default)]
    pub attempt_id: Option<String>,
}

/// Attempts row for files created before `attempt_id` was stored.
#[derive(Debug, Serialize)]
pub(crate) struct LegacyAttemptRow<'a> {
    #[serde(with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub name: &'a str,
    pub score: u32,
    pub total_questions: u32,
    pub time_taken: &'a str,
    #[serde(with = "py_bool")]
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AnswerRow {
    pub attempt_id: String,
    pub question_id: i64,
    pub answer: String,
    #[serde(with = "py_bool")]
    pub correct: bool,
    #[serde(with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl From<&AttemptSummary> for AttemptRow {
    fn from(s: &AttemptSummary) -> Self {
        Self {
            timestamp: s.timestamp,
            name: s.taker_name.clone(),
            score: s.score,
            total_questions: s.total_questions,
            time_taken: s.time_taken.clone(),
            completed: s.completed,
            attempt_id: s.attempt_key.as_ref().map(|k| k.as_str().to_string()),
        }
    }
}

impl<'a> From<&'a AttemptSummary> for LegacyAttemptRow<'a> {
    fn from(s: &'a AttemptSummary) -> Self {
        Self {
            timestamp: s.timestamp,
            name: &s.taker_name,
            score: s.score,
            total_questions: s.total_questions,
            time_taken: &s.time_taken,
            completed: s.completed,
        }
    }
}

impl From<AttemptRow> for AttemptSummary {
    fn from(r: AttemptRow) -> Self {
        Self {
            timestamp: r.timestamp,
            taker_name: r.name,
            score: r.score,
            total_questions: r.total_questions,
            time_taken: r.time_taken,
            completed: r.completed,
            attempt_key: r.attempt_id.filter(|id| !id.is_empty()).map(AttemptKey::from),
        }
    }
}

impl From<&AnswerRecord> for AnswerRow {
    fn from(a: &AnswerRecord) -> Self {
        Self {
            attempt_id: a.attempt_key.as_str().to_string(),
            question_id: a.question_id,
            answer: a.chosen_answer.clone(),
            correct: a.is_correct,
            timestamp: a.timestamp,
        }
    }
}

impl From<AnswerRow> for AnswerRecord {
    fn from(r: AnswerRow) -> Self {
        Self {
            attempt_key: AttemptKey::from(r.attempt_id),
            question_id: r.question_id,
            chosen_answer: r.answer,
            is_correct: r.correct,
            timestamp: r.timestamp,
        }
    }
}

/// Parse an ISO-8601 timestamp, with or without an offset.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

mod iso_timestamp {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

mod py_bool {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *v { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(de::Error::custom(format!("invalid boolean '{raw}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_legacy_naive() {
        let utc = parse_timestamp("2024-05-01T12:34:56.123456Z").unwrap();
        let naive = parse_timestamp("2024-05-01T12:34:56.123456").unwrap();
        assert_eq!(utc, naive);

        let offset = parse_timestamp("2024-05-01T14:34:56.123456+02:00").unwrap();
        assert_eq!(offset, utc);

        assert!(parse_timestamp("2024-05-01T12:34:56").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}

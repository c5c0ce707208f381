//! Append-only CSV result store.
//!
//! Each append opens the table in append mode, writes a header first if
//! the file is new or empty, and writes one row. There is no locking:
//! one writer per process is assumed.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use quizkit_core::config::QuizConfig;
use quizkit_core::error::StoreError;
use quizkit_core::model::{AnswerRecord, AttemptSummary};
use quizkit_core::traits::ResultStore;

use crate::rows::{AnswerRow, AttemptRow, LegacyAttemptRow};

const ATTEMPTS_TABLE: &str = "attempts";
const ANSWERS_TABLE: &str = "answers";

/// Result store backed by two CSV files.
#[derive(Debug, Clone)]
pub struct CsvResultStore {
    attempts_path: PathBuf,
    answers_path: PathBuf,
}

impl CsvResultStore {
    pub fn new(attempts_path: impl Into<PathBuf>, answers_path: impl Into<PathBuf>) -> Self {
        Self {
            attempts_path: attempts_path.into(),
            answers_path: answers_path.into(),
        }
    }

    /// Store using the paths named by `config`.
    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(config.attempts_path(), config.answers_path())
    }

    pub fn attempts_path(&self) -> &Path {
        &self.attempts_path
    }

    pub fn answers_path(&self) -> &Path {
        &self.answers_path
    }
}

impl ResultStore for CsvResultStore {
    fn name(&self) -> &str {
        "csv"
    }

    fn append_answer(&self, record: &AnswerRecord) -> Result<(), StoreError> {
        append_row(&self.answers_path, ANSWERS_TABLE, &AnswerRow::from(record))
    }

    fn append_summary(&self, summary: &AttemptSummary) -> Result<(), StoreError> {
        let legacy = match read_header(&self.attempts_path, ATTEMPTS_TABLE)? {
            Some(header) => !header.iter().any(|h| h == "attempt_id"),
            None => false,
        };
        if legacy {
            tracing::debug!(
                path = %self.attempts_path.display(),
                "attempts file has no attempt_id column, writing legacy row"
            );
            append_row(
                &self.attempts_path,
                ATTEMPTS_TABLE,
                &LegacyAttemptRow::from(summary),
            )
        } else {
            append_row(&self.attempts_path, ATTEMPTS_TABLE, &AttemptRow::from(summary))
        }
    }

    fn read_all_summaries(&self) -> Result<Vec<AttemptSummary>, StoreError> {
        let rows: Vec<AttemptRow> = read_rows(&self.attempts_path, ATTEMPTS_TABLE)?;
        Ok(rows.into_iter().map(AttemptSummary::from).collect())
    }

    fn read_all_answers(&self) -> Result<Vec<AnswerRecord>, StoreError> {
        let rows: Vec<AnswerRow> = read_rows(&self.answers_path, ANSWERS_TABLE)?;
        Ok(rows.into_iter().map(AnswerRecord::from).collect())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn csv_error(path: &Path, table: &'static str, err: csv::Error) -> StoreError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => io_error(path, source),
            other => StoreError::Format {
                table,
                message: format!("{other:?}"),
            },
        }
    } else {
        StoreError::Format {
            table,
            message: err.to_string(),
        }
    }
}

/// Append one serialized row, writing the header if the file is empty.
pub(crate) fn append_row<T: Serialize>(
    path: &Path,
    table: &'static str,
    row: &T,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    let needs_header = file.metadata().map_err(|e| io_error(path, e))?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer
        .serialize(row)
        .map_err(|e| csv_error(path, table, e))?;
    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Read every row of a table; a missing or empty file yields no rows.
pub(crate) fn read_rows<T: DeserializeOwned>(
    path: &Path,
    table: &'static str,
) -> Result<Vec<T>, StoreError> {
    let Some(file) = open_existing(path)? else {
        return Ok(Vec::new());
    };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| match csv_error(path, table, e) {
                StoreError::Format { table, message } => StoreError::Format {
                    table,
                    message: format!("row {}: {message}", i + 1),
                },
                other => other,
            })
        })
        .collect()
}

fn read_header(
    path: &Path,
    table: &'static str,
) -> Result<Option<csv::StringRecord>, StoreError> {
    let Some(file) = open_existing(path)? else {
        return Ok(None);
    };
    let mut reader = csv::Reader::from_reader(file);
    let header = reader
        .headers()
        .map_err(|e| csv_error(path, table, e))?
        .clone();
    Ok(if header.is_empty() { None } else { Some(header) })
}

fn open_existing(path: &Path) -> Result<Option<File>, StoreError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

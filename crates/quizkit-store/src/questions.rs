//! CSV question source: `id,question,options,correct_answer`.

use std::path::Path;

use quizkit_core::bank::{QuestionBank, RawQuestion};
use quizkit_core::error::{QuizError, StoreError};

use crate::csv_store::{append_row, read_rows};

const QUESTIONS_TABLE: &str = "questions";

/// Load the question bank from `path`, seeding the default set first if
/// the file does not exist.
pub fn load_question_bank(path: &Path) -> Result<QuestionBank, QuizError> {
    if seed_default_questions(path)? {
        tracing::info!(path = %path.display(), "seeded default questions");
    }

    let rows: Vec<RawQuestion> = read_rows(path, QUESTIONS_TABLE).map_err(load_error)?;
    let bank = QuestionBank::from_raw(rows)?;
    tracing::debug!(path = %path.display(), questions = bank.size(), "question bank loaded");
    Ok(bank)
}

/// Write the default question set to `path` unless it already exists.
///
/// Returns `true` if the file was created.
pub fn seed_default_questions(path: &Path) -> Result<bool, QuizError> {
    if path.exists() {
        return Ok(false);
    }
    write_questions(path, &QuestionBank::default_set())?;
    Ok(true)
}

/// Append every question of `bank` to `path`.
pub fn write_questions(path: &Path, bank: &QuestionBank) -> Result<(), QuizError> {
    for row in bank.to_raw() {
        append_row(path, QUESTIONS_TABLE, &row).map_err(load_error)?;
    }
    Ok(())
}

fn load_error(e: StoreError) -> QuizError {
    QuizError::Load(e.to_string())
}

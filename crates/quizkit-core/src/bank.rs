//! The fixed, ordered set of questions a quiz runs through.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{Question, OPTIONS_PER_QUESTION};
use crate::parser::{format_options, parse_options};

/// A question as stored, with its options still in list-literal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: i64,
    pub question: String,
    pub options: String,
    pub correct_answer: String,
}

impl RawQuestion {
    /// Parse and validate into a `Question`.
    pub fn parse(self) -> Result<Question, QuizError> {
        let options = parse_options(&self.options)
            .map_err(|e| QuizError::Load(format!("question {}: {e}", self.id)))?;

        if options.len() != OPTIONS_PER_QUESTION {
            return Err(QuizError::Load(format!(
                "question {}: expected {OPTIONS_PER_QUESTION} options, found {}",
                self.id,
                options.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = options.iter().find(|o| !seen.insert(o.as_str())) {
            return Err(QuizError::Load(format!(
                "question {}: duplicate option '{dup}'",
                self.id
            )));
        }

        if !options.contains(&self.correct_answer) {
            return Err(QuizError::Load(format!(
                "question {}: correct answer '{}' is not one of the options",
                self.id, self.correct_answer
            )));
        }

        Ok(Question {
            id: self.id,
            text: self.question,
            options,
            correct_answer: self.correct_answer,
        })
    }
}

impl From<&Question> for RawQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question: q.text.clone(),
            options: format_options(&q.options),
            correct_answer: q.correct_answer.clone(),
        }
    }
}

/// Ordered, read-only question set. Index order is quiz order.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already-parsed questions.
    ///
    /// Fails if the set is empty or two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Load("question bank is empty".into()));
        }
        let mut ids = HashSet::new();
        for q in &questions {
            if !ids.insert(q.id) {
                return Err(QuizError::Load(format!("duplicate question id {}", q.id)));
            }
        }
        Ok(Self { questions })
    }

    /// Parse stored rows into a bank, failing on the first bad row.
    pub fn from_raw(rows: Vec<RawQuestion>) -> Result<Self, QuizError> {
        let questions = rows
            .into_iter()
            .map(RawQuestion::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    /// The bank seeded on first use when no question source exists.
    pub fn default_set() -> Self {
        Self {
            questions: default_questions(),
        }
    }

    pub fn size(&self) -> usize {
        self.questions.len()
    }

    /// The question at `index`.
    pub fn at(&self, index: usize) -> Result<&Question, QuizError> {
        self.questions.get(index).ok_or(QuizError::Index {
            index,
            size: self.questions.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Rows suitable for writing back to the question source.
    pub fn to_raw(&self) -> Vec<RawQuestion> {
        self.questions.iter().map(RawQuestion::from).collect()
    }
}

fn default_questions() -> Vec<Question> {
    let q = |id: i64, text: &str, options: [&str; OPTIONS_PER_QUESTION], correct: &str| Question {
        id,
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer: correct.to_string(),
    };

    vec![
        q(
            1,
            "What is the capital of France?",
            ["London", "Berlin", "Paris", "Madrid"],
            "Paris",
        ),
        q(
            2,
            "Which planet is known as the Red Planet?",
            ["Venus", "Mars", "Jupiter", "Saturn"],
            "Mars",
        ),
        q(
            3,
            "What is the largest mammal in the world?",
            ["African Elephant", "Blue Whale", "Giraffe", "Hippopotamus"],
            "Blue Whale",
        ),
        q(
            4,
            "Who painted the Mona Lisa?",
            [
                "Vincent van Gogh",
                "Pablo Picasso",
                "Leonardo da Vinci",
                "Michelangelo",
            ],
            "Leonardo da Vinci",
        ),
        q(
            5,
            "What is the chemical symbol for gold?",
            ["Ag", "Fe", "Au", "Cu"],
            "Au",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, options: &str, correct: &str) -> RawQuestion {
        RawQuestion {
            id,
            question: format!("Question {id}?"),
            options: options.into(),
            correct_answer: correct.into(),
        }
    }

    #[test]
    fn default_set_is_valid() {
        let bank = QuestionBank::default_set();
        assert_eq!(bank.size(), 5);
        for q in bank.iter() {
            assert_eq!(q.options.len(), OPTIONS_PER_QUESTION);
            assert!(q.options.contains(&q.correct_answer));
        }
        // Round-trips through the stored form.
        let reparsed = QuestionBank::from_raw(bank.to_raw()).unwrap();
        assert_eq!(reparsed.at(3).unwrap(), bank.at(3).unwrap());
    }

    #[test]
    fn at_out_of_range() {
        let bank = QuestionBank::default_set();
        assert!(bank.at(4).is_ok());
        assert!(matches!(
            bank.at(5),
            Err(QuizError::Index { index: 5, size: 5 })
        ));
    }

    #[test]
    fn rejects_unparsable_options() {
        let err = QuestionBank::from_raw(vec![raw(1, "Paris, London", "Paris")]).unwrap_err();
        assert!(matches!(err, QuizError::Load(_)));
    }

    #[test]
    fn rejects_correct_answer_not_in_options() {
        let err = QuestionBank::from_raw(vec![raw(1, "['a', 'b', 'c', 'd']", "e")]).unwrap_err();
        assert!(err.to_string().contains("not one of the options"));
    }

    #[test]
    fn rejects_wrong_option_count_and_duplicates() {
        assert!(QuestionBank::from_raw(vec![raw(1, "['a', 'b', 'c']", "a")]).is_err());
        let err = QuestionBank::from_raw(vec![raw(1, "['a', 'b', 'a', 'd']", "a")]).unwrap_err();
        assert!(err.to_string().contains("duplicate option"));
    }

    #[test]
    fn rejects_empty_bank_and_duplicate_ids() {
        assert!(QuestionBank::from_raw(vec![]).is_err());
        let rows = vec![
            raw(7, "['a', 'b', 'c', 'd']", "a"),
            raw(7, "['w', 'x', 'y', 'z']", "z"),
        ];
        let err = QuestionBank::from_raw(rows).unwrap_err();
        assert!(err.to_string().contains("duplicate question id 7"));
    }
}

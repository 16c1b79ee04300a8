use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── RAW QUESTION ──────────────────────────────────────────────────────────────
//

/// A question exactly as the provider ships it: HTML-entity-encoded text and
/// the correct answer kept separate from the incorrect ones.
///
/// The serde field names match the provider's wire shape so responses
/// deserialize straight into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuestion {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has no answers")]
    NoAnswers,

    #[error("answer list does not contain the correct answer")]
    MissingCorrectAnswer,

    #[error("correct answer appears {count} times in the answer list")]
    DuplicateCorrectAnswer { count: usize },
}

/// A decoded, presentation-ready question.
///
/// `answers` is the display order: every answer appears exactly once and
/// contains `correct_answer` exactly once. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    text: String,
    correct_answer: String,
    answers: Vec<String>,
}

impl Question {
    /// Build a question from decoded text and an already-ordered answer list.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::NoAnswers` for an empty answer list,
    /// `QuestionError::MissingCorrectAnswer` when `correct_answer` is absent
    /// from `answers`, and `QuestionError::DuplicateCorrectAnswer` when it
    /// appears more than once.
    pub fn new(
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        answers: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let correct_answer = correct_answer.into();

        if answers.is_empty() {
            return Err(QuestionError::NoAnswers);
        }
        let count = answers.iter().filter(|a| **a == correct_answer).count();
        match count {
            0 => Err(QuestionError::MissingCorrectAnswer),
            1 => Ok(Self {
                text,
                correct_answer,
                answers,
            }),
            count => Err(QuestionError::DuplicateCorrectAnswer { count }),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Whether the given answer text matches the correct answer exactly.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionSetError {
    #[error("question set is empty")]
    Empty,
}

/// The ordered questions of one quiz session.
///
/// Owned exclusively by the active session and replaced wholesale when a new
/// category is chosen; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Wrap an ordered list of questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Empty` when the list has no questions.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, QuestionSetError> {
        if questions.is_empty() {
            return Err(QuestionSetError::Empty);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Question] {
        &self.questions
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

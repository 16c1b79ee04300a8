use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AnswerRecord, Category, QuestionSet};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("expected one record per question ({expected}), got {got}")]
    RecordMismatch { expected: usize, got: usize },

    #[error("records are not in question order at position {position}")]
    RecordOutOfOrder { position: usize },

    #[error("score ({score}) does not match correct record count ({correct})")]
    ScoreMismatch { score: usize, correct: usize },
}

/// One line of the final score card: the question, what the right answer
/// was, and whether the player got it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub question: String,
    pub correct_answer: String,
    pub was_correct: bool,
}

/// Aggregate summary for a completed quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    category: Category,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    score: usize,
    entries: Vec<ReportEntry>,
}

impl SessionReport {
    /// Build a report from a finished session's questions and records.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTimeRange` if `completed_at` precedes
    /// `started_at`, `ReportError::RecordMismatch`/`RecordOutOfOrder` if the
    /// records do not cover every question exactly once in order, and
    /// `ReportError::ScoreMismatch` if `score` disagrees with the records.
    pub fn from_records(
        category: Category,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        questions: &QuestionSet,
        records: &[AnswerRecord],
        score: usize,
    ) -> Result<Self, ReportError> {
        if completed_at < started_at {
            return Err(ReportError::InvalidTimeRange);
        }
        if records.len() != questions.len() {
            return Err(ReportError::RecordMismatch {
                expected: questions.len(),
                got: records.len(),
            });
        }
        for (position, record) in records.iter().enumerate() {
            if record.question_index != position {
                return Err(ReportError::RecordOutOfOrder { position });
            }
        }
        let correct = records.iter().filter(|r| r.was_correct).count();
        if correct != score {
            return Err(ReportError::ScoreMismatch { score, correct });
        }

        let entries = questions
            .iter()
            .zip(records)
            .map(|(question, record)| ReportEntry {
                question: question.text().to_owned(),
                correct_answer: question.correct_answer().to_owned(),
                was_correct: record.was_correct,
            })
            .collect();

        Ok(Self {
            category,
            started_at,
            completed_at,
            score,
            entries,
        })
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Total number of questions in the session.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }
}

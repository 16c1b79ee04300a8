use trivia_core::model::{AnswerRecord, Category, Question, SessionReport};

use super::machine::{Phase, QuizSession};

/// The phase a snapshot was taken in, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Loading,
    InProgress,
    Complete,
    Failed,
}

/// An owned copy of everything a view needs to render the session.
///
/// Snapshots share nothing with the live session: a view holding one never
/// blocks or observes a mutation in progress. Consumers re-derive whatever
/// they display from the latest snapshot rather than from change events.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: PhaseKind,
    pub category: Option<Category>,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub score: usize,
    pub selected_answer: Option<String>,
    pub answer_locked: bool,
    pub timer_seconds: u32,
    pub seconds_per_question: u32,
    pub records: Vec<AnswerRecord>,
    pub report: Option<SessionReport>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn question_total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }
}

impl QuizSession {
    /// Copy the current state into an owned, render-ready value.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let base = SessionSnapshot {
            phase: PhaseKind::Idle,
            category: None,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            selected_answer: None,
            answer_locked: false,
            timer_seconds: 0,
            seconds_per_question: self.rules().seconds_per_question(),
            records: Vec::new(),
            report: None,
            error: None,
        };

        match self.phase() {
            Phase::Idle => base,
            Phase::Loading { category } => SessionSnapshot {
                phase: PhaseKind::Loading,
                category: Some(category.clone()),
                ..base
            },
            Phase::InProgress(round) => SessionSnapshot {
                phase: PhaseKind::InProgress,
                category: Some(round.category().clone()),
                questions: round.questions().as_slice().to_vec(),
                current_index: round.current_index(),
                score: round.score(),
                selected_answer: round.selected_answer().map(str::to_owned),
                answer_locked: round.answer_locked(),
                timer_seconds: round.timer_seconds(),
                records: round.records().to_vec(),
                ..base
            },
            Phase::Complete { report } => SessionSnapshot {
                phase: PhaseKind::Complete,
                category: Some(report.category().clone()),
                score: report.score(),
                report: Some(report.clone()),
                ..base
            },
            Phase::Failed { message } => SessionSnapshot {
                phase: PhaseKind::Failed,
                error: Some(message.clone()),
                ..base
            },
        }
    }
}

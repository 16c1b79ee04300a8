/// Outcome of one visited question.
///
/// The session appends exactly one record per question, in visiting order,
/// and never mutates a record afterwards. A timed-out question records
/// `was_correct == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub was_correct: bool,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(question_index: usize, was_correct: bool) -> Self {
        Self {
            question_index,
            was_correct,
        }
    }
}

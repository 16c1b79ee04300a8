use log::warn;
use rand::Rng;
use thiserror::Error;

use trivia_core::decode::{DecodeError, decode_text};
use trivia_core::model::{Question, QuestionError, QuestionSet, QuestionSetError, RawQuestion};

use crate::shuffle::shuffle_answers;

/// Failure while turning one provider question into a playable question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Decode one provider question and shuffle its answers into display order.
///
/// Decoding covers the question text, the correct answer, and every
/// distractor; the shuffle happens exactly once, here.
///
/// # Errors
///
/// Returns `NormalizeError::Decode` for an undecodable numeric character
/// reference and `NormalizeError::Question` when the decoded answers no
/// longer contain the correct answer exactly once.
pub fn normalize_question<R: Rng + ?Sized>(
    raw: &RawQuestion,
    rng: &mut R,
) -> Result<Question, NormalizeError> {
    let text = decode_text(&raw.question)?;
    let correct = decode_text(&raw.correct_answer)?;
    let incorrect = raw
        .incorrect_answers
        .iter()
        .map(|answer| decode_text(answer))
        .collect::<Result<Vec<_>, _>>()?;

    let answers = shuffle_answers(&correct, &incorrect, rng);
    Ok(Question::new(text, correct, answers)?)
}

/// Build the playable set for a session, recovering per question instead of
/// aborting the whole load.
///
/// A question that fails to normalize keeps its raw, entity-encoded strings;
/// a question that is malformed even raw is dropped. Both paths log a
/// warning and neither fails the set.
///
/// # Errors
///
/// Returns `QuestionSetError::Empty` only when every question was dropped.
pub fn normalize_set<R: Rng + ?Sized>(
    raws: &[RawQuestion],
    rng: &mut R,
) -> Result<QuestionSet, QuestionSetError> {
    let mut questions = Vec::with_capacity(raws.len());
    for raw in raws {
        match normalize_question(raw, rng) {
            Ok(question) => questions.push(question),
            Err(error) => {
                warn!("keeping raw text for a question that failed to decode: {error}");
                match raw_question(raw, rng) {
                    Ok(question) => questions.push(question),
                    Err(error) => warn!("dropping malformed question: {error}"),
                }
            }
        }
    }
    QuestionSet::from_questions(questions)
}

fn raw_question<R: Rng + ?Sized>(
    raw: &RawQuestion,
    rng: &mut R,
) -> Result<Question, QuestionError> {
    let answers = shuffle_answers(&raw.correct_answer, &raw.incorrect_answers, rng);
    Question::new(raw.question.clone(), raw.correct_answer.clone(), answers)
}

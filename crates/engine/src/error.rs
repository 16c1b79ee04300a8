//! Error types shared across the quiz engine.

use thiserror::Error;

use provider::ProviderError;
use trivia_core::model::{CategoryId, ReportError};

/// Errors emitted by the session machine and the controller.
///
/// Every variant is per-call: a rejected command leaves the session exactly
/// as it was, and `restart` recovers from any phase.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no quiz is in progress")]
    NotInProgress,

    #[error("a question set is already loading")]
    LoadInFlight,

    #[error("a quiz is already in progress")]
    SessionActive,

    #[error("time is up for this question")]
    TimeExpired,

    #[error("select an answer first")]
    NoAnswerSelected,

    #[error("the load no longer belongs to this session")]
    StaleLoad,

    #[error("unknown category {0}")]
    UnknownCategory(CategoryId),

    #[error("no playable questions in the set")]
    EmptySet,

    #[error(transparent)]
    Fetch(#[from] ProviderError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("session state lock poisoned: {0}")]
    Lock(String),
}

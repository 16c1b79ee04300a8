#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod normalize;
pub mod rules;
pub mod session;
pub mod shuffle;
mod timer;

pub use trivia_core::Clock;

pub use controller::QuizController;
pub use error::SessionError;
pub use normalize::{NormalizeError, normalize_question, normalize_set};
pub use rules::QuizRules;
pub use session::{
    ActiveRound, LoadToken, Phase, PhaseKind, QuizSession, SessionSnapshot, Step, Tick,
};
pub use shuffle::{shuffle_answers, shuffle_answers_thread};

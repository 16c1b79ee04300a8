mod machine;
mod snapshot;

// Public API of the session subsystem.
pub use machine::{ActiveRound, LoadToken, Phase, QuizSession, Step, Tick};
pub use snapshot::{PhaseKind, SessionSnapshot};

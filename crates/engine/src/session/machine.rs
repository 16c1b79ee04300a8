use chrono::{DateTime, Utc};

use trivia_core::model::{AnswerRecord, Category, QuestionSet, SessionReport};

use crate::error::SessionError;
use crate::rules::QuizRules;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Where the session currently stands.
///
/// The payload carries everything the phase needs; there are no standalone
/// loading or error flags to fall out of sync with it.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Phase {
    Idle,
    Loading { category: Category },
    InProgress(ActiveRound),
    Complete { report: SessionReport },
    Failed { message: String },
}

/// State of the round being played.
#[derive(Debug, Clone)]
pub struct ActiveRound {
    category: Category,
    questions: QuestionSet,
    current_index: usize,
    score: usize,
    selected_answer: Option<String>,
    answer_locked: bool,
    timer_seconds: u32,
    records: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
}

impl ActiveRound {
    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<&str> {
        self.selected_answer.as_deref()
    }

    #[must_use]
    pub fn answer_locked(&self) -> bool {
        self.answer_locked
    }

    #[must_use]
    pub fn timer_seconds(&self) -> u32 {
        self.timer_seconds
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Proof that a load was started and has not been superseded.
///
/// `finish_loading` and `fail_loading` only accept the token handed out by
/// the `begin_loading` they belong to; a restart or a newer load invalidates
/// older tokens, so a fetch that completes late detects it and backs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken {
    generation: u64,
}

/// Outcome of closing out one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The next question started; run a countdown for this generation.
    Next { generation: u64 },
    /// That was the last question and the session is now `Complete`.
    Finished,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The tick belonged to an earlier question or session; nothing changed.
    Stale,
    /// One interval elapsed with time still on the clock.
    Counted { remaining: u32 },
    /// The countdown hit zero and the question was closed out unanswered.
    Expired(Step),
}

//
// ─── SESSION MACHINE ───────────────────────────────────────────────────────────
//

/// The quiz session state machine.
///
/// Purely synchronous: callers own concurrency and time. Asynchronous
/// collaborators (the provider fetch, the countdown task) are tied back to
/// the machine through generation numbers, so anything that completes after
/// the session has moved on identifies itself as stale instead of corrupting
/// the new state.
#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: Phase,
    rules: QuizRules,
    generation: u64,
}

impl QuizSession {
    #[must_use]
    pub fn new(rules: QuizRules) -> Self {
        Self {
            phase: Phase::Idle,
            rules,
            generation: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn rules(&self) -> &QuizRules {
        &self.rules
    }

    /// Current generation; bumped on every load start, question start, and
    /// restart.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Move into `Loading` for the given category.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LoadInFlight` while another load is running
    /// and `SessionError::SessionActive` while questions are on screen.
    pub fn begin_loading(&mut self, category: Category) -> Result<LoadToken, SessionError> {
        match self.phase {
            Phase::Loading { .. } => Err(SessionError::LoadInFlight),
            Phase::InProgress(_) => Err(SessionError::SessionActive),
            Phase::Idle | Phase::Complete { .. } | Phase::Failed { .. } => {
                self.generation += 1;
                self.phase = Phase::Loading { category };
                Ok(LoadToken {
                    generation: self.generation,
                })
            }
        }
    }

    /// Commit a fetched question set and start the first question.
    ///
    /// Returns the timer generation the caller should run a countdown for.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StaleLoad` when the token no longer matches,
    /// which happens after a restart or a newer load.
    pub fn finish_loading(
        &mut self,
        token: LoadToken,
        questions: QuestionSet,
        now: DateTime<Utc>,
    ) -> Result<u64, SessionError> {
        let category = match &self.phase {
            Phase::Loading { category } if token.generation == self.generation => category.clone(),
            _ => return Err(SessionError::StaleLoad),
        };

        self.generation += 1;
        self.phase = Phase::InProgress(ActiveRound {
            category,
            questions,
            current_index: 0,
            score: 0,
            selected_answer: None,
            answer_locked: false,
            timer_seconds: self.rules.seconds_per_question(),
            records: Vec::new(),
            started_at: now,
        });
        Ok(self.generation)
    }

    /// Record a failed load and move into `Failed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StaleLoad` when the token no longer matches.
    pub fn fail_loading(
        &mut self,
        token: LoadToken,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        match &self.phase {
            Phase::Loading { .. } if token.generation == self.generation => {
                self.generation += 1;
                self.phase = Phase::Failed {
                    message: message.into(),
                };
                Ok(())
            }
            _ => Err(SessionError::StaleLoad),
        }
    }

    /// Lock in an answer for the current question.
    ///
    /// The first selection wins; repeated calls while locked are accepted
    /// and ignored so a double click cannot change the answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside a running round and
    /// `SessionError::TimeExpired` once the countdown owns this question.
    pub fn select_answer(&mut self, answer: &str) -> Result<(), SessionError> {
        let round = self.round_mut()?;
        if round.answer_locked {
            return Ok(());
        }
        if round.timer_seconds == 0 {
            return Err(SessionError::TimeExpired);
        }
        round.selected_answer = Some(answer.to_owned());
        round.answer_locked = true;
        Ok(())
    }

    /// Close out the current question on the player's request.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoAnswerSelected` when nothing is locked in
    /// and time remains; the round is left untouched.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Step, SessionError> {
        let round = self.round_mut()?;
        if round.selected_answer.is_none() && round.timer_seconds > 0 {
            return Err(SessionError::NoAnswerSelected);
        }
        self.step(now)
    }

    /// Close out the current question because its time ran out.
    ///
    /// A missing selection counts as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside a running round.
    pub fn force_advance(&mut self, now: DateTime<Utc>) -> Result<Step, SessionError> {
        self.round_mut()?;
        self.step(now)
    }

    /// Apply one countdown tick for the given timer generation.
    ///
    /// A tick against a finished question or an older session reports
    /// `Tick::Stale` and changes nothing. The tick that reaches zero is the
    /// single expiry: it closes the question out in the same call, so a
    /// zero-second round state is never left behind.
    ///
    /// # Errors
    ///
    /// Propagates report-building failures from the final question's expiry.
    pub fn apply_tick(&mut self, generation: u64, now: DateTime<Utc>) -> Result<Tick, SessionError> {
        let remaining = {
            let Phase::InProgress(round) = &mut self.phase else {
                return Ok(Tick::Stale);
            };
            if generation != self.generation {
                return Ok(Tick::Stale);
            }
            round.timer_seconds = round.timer_seconds.saturating_sub(1);
            round.timer_seconds
        };

        if remaining == 0 {
            Ok(Tick::Expired(self.step(now)?))
        } else {
            Ok(Tick::Counted { remaining })
        }
    }

    /// Abandon whatever is happening and return to `Idle`.
    ///
    /// Always succeeds. The generation bump orphans in-flight ticks and
    /// pending load commits, which then report themselves stale.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.phase = Phase::Idle;
    }

    /// Shared step: record the outcome of the current question and either
    /// start the next one or complete the session.
    fn step(&mut self, now: DateTime<Utc>) -> Result<Step, SessionError> {
        let Phase::InProgress(round) = &mut self.phase else {
            return Err(SessionError::NotInProgress);
        };

        let answered = round.selected_answer.take();
        round.answer_locked = false;
        let was_correct = match (&answered, round.questions.get(round.current_index)) {
            (Some(answer), Some(question)) => question.is_correct(answer),
            _ => false,
        };

        round
            .records
            .push(AnswerRecord::new(round.current_index, was_correct));
        if was_correct {
            round.score += 1;
        }

        if round.current_index + 1 < round.questions.len() {
            round.current_index += 1;
            round.timer_seconds = self.rules.seconds_per_question();
            self.generation += 1;
            Ok(Step::Next {
                generation: self.generation,
            })
        } else {
            let report = SessionReport::from_records(
                round.category.clone(),
                round.started_at,
                now,
                &round.questions,
                &round.records,
                round.score,
            )?;
            self.generation += 1;
            self.phase = Phase::Complete { report };
            Ok(Step::Finished)
        }
    }

    fn round_mut(&mut self) -> Result<&mut ActiveRound, SessionError> {
        match &mut self.phase {
            Phase::InProgress(round) => Ok(round),
            _ => Err(SessionError::NotInProgress),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

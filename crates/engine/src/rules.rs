use std::time::Duration;

/// Sizing and pacing rules for a quiz session.
///
/// The countdown is expressed as a number of seconds; `tick_interval` only
/// controls how often the running countdown task fires and may differ from
/// one wall-clock second without changing any session semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRules {
    questions_per_set: u8,
    seconds_per_question: u32,
    tick_interval: Duration,
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            questions_per_set: 5,
            seconds_per_question: 10,
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl QuizRules {
    #[must_use]
    pub fn questions_per_set(&self) -> u8 {
        self.questions_per_set
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Number of questions to request per session. Zero is clamped to one.
    #[must_use]
    pub fn with_questions_per_set(mut self, count: u8) -> Self {
        self.questions_per_set = count.max(1);
        self
    }

    /// Seconds on the clock per question. Zero is clamped to one.
    #[must_use]
    pub fn with_seconds_per_question(mut self, seconds: u32) -> Self {
        self.seconds_per_question = seconds.max(1);
        self
    }

    /// How often the countdown task fires. Zero is clamped to a millisecond.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }
}

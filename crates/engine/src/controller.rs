use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use provider::QuestionSource;
use trivia_core::Clock;
use trivia_core::model::{Category, CategoryId};

use crate::error::SessionError;
use crate::normalize::normalize_set;
use crate::rules::QuizRules;
use crate::session::{LoadToken, QuizSession, SessionSnapshot, Step};
use crate::timer::{TimerHandle, spawn_countdown};

/// Single-session façade over the machine, the provider, and the countdown.
///
/// Cheap to clone; all clones drive the same session. Every mutation runs
/// under one state lock and ends by publishing a fresh snapshot, so timer
/// ticks, fetch commits, and player commands serialize against each other
/// and observers always see settled states.
#[derive(Clone)]
pub struct QuizController {
    inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    session: Mutex<QuizSession>,
    timer: Mutex<Option<TimerHandle>>,
    categories: Mutex<Option<Vec<Category>>>,
    source: Arc<dyn QuestionSource>,
    clock: Clock,
    rules: QuizRules,
    publisher: watch::Sender<SessionSnapshot>,
}

impl QuizController {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, rules: QuizRules, clock: Clock) -> Self {
        let session = QuizSession::new(rules.clone());
        let (publisher, _) = watch::channel(session.snapshot());
        Self {
            inner: Arc::new(ControllerInner {
                session: Mutex::new(session),
                timer: Mutex::new(None),
                categories: Mutex::new(None),
                source,
                clock,
                rules,
                publisher,
            }),
        }
    }

    /// The categories offered for selection, fetched once and cached for the
    /// lifetime of the controller.
    ///
    /// # Errors
    ///
    /// Provider failures surface here directly; the session state is
    /// untouched and the call can simply be retried.
    pub async fn categories(&self) -> Result<Vec<Category>, SessionError> {
        if let Some(cached) = self.inner.cached_categories()? {
            return Ok(cached);
        }
        let fetched = self.inner.source.fetch_categories().await?;
        // Concurrent first calls may fetch twice; the cache keeps the last.
        self.inner.store_categories(fetched.clone())?;
        Ok(fetched)
    }

    /// Start a session for the category: fetch questions, normalize them,
    /// and begin the first countdown.
    ///
    /// While the fetch is in flight the session is observably `Loading` and
    /// rejects competing commands. A restart during the fetch wins: the late
    /// result is discarded silently and this call returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` for an id the provider does
    /// not list, `LoadInFlight`/`SessionActive` while a load or round is
    /// already underway, and `Fetch`/`EmptySet` when the provider fails;
    /// the two latter also move the session to `Failed`.
    pub async fn select_category(&self, id: CategoryId) -> Result<(), SessionError> {
        let category = self.resolve_category(id).await?;

        let token = {
            let mut session = self.inner.lock_session()?;
            let token = session.begin_loading(category)?;
            self.inner.publish(&session);
            token
        };

        let amount = self.inner.rules.questions_per_set();
        let fetched = self.inner.source.fetch_question_set(id, amount).await;

        let mut session = self.inner.lock_session()?;
        let raws = match fetched {
            Ok(raws) => raws,
            Err(error) => {
                return self.fail_load(&mut session, token, SessionError::Fetch(error));
            }
        };

        let mut rng = rand::rng();
        let questions = match normalize_set(&raws, &mut rng) {
            Ok(questions) => questions,
            // Every question in the payload was malformed.
            Err(_) => return self.fail_load(&mut session, token, SessionError::EmptySet),
        };

        match session.finish_loading(token, questions, self.inner.now()) {
            Ok(generation) => {
                let handle = spawn_countdown(Arc::clone(&self.inner), generation);
                self.inner.install_timer(handle)?;
                self.inner.publish(&session);
                Ok(())
            }
            Err(SessionError::StaleLoad) => Ok(()),
            Err(other) => Err(other),
        }
    }

    /// Lock in an answer for the current question. First answer wins.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside a running round and
    /// `SessionError::TimeExpired` once the countdown owns the question.
    pub fn select_answer(&self, answer: &str) -> Result<(), SessionError> {
        let mut session = self.inner.lock_session()?;
        session.select_answer(answer)?;
        self.inner.publish(&session);
        Ok(())
    }

    /// Move to the next question, or finish the session on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoAnswerSelected` when nothing is locked in
    /// yet; the round keeps running unchanged.
    pub fn advance(&self) -> Result<(), SessionError> {
        let mut session = self.inner.lock_session()?;
        let step = session.advance(self.inner.now())?;
        match step {
            Step::Next { generation } => {
                let handle = spawn_countdown(Arc::clone(&self.inner), generation);
                self.inner.install_timer(handle)?;
            }
            Step::Finished => self.inner.clear_timer()?,
        }
        self.inner.publish(&session);
        Ok(())
    }

    /// Abandon the current session and return to category selection.
    ///
    /// # Errors
    ///
    /// Only lock poisoning can fail this; the reset itself always applies.
    pub fn restart(&self) -> Result<(), SessionError> {
        let mut session = self.inner.lock_session()?;
        session.restart();
        self.inner.clear_timer()?;
        self.inner.publish(&session);
        Ok(())
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.publisher.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    ///
    /// Delivery is at-least-once per settled state but coalescing: a slow
    /// reader may skip intermediate snapshots and only see the latest.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.publisher.subscribe()
    }

    async fn resolve_category(&self, id: CategoryId) -> Result<Category, SessionError> {
        let categories = self.categories().await?;
        categories
            .into_iter()
            .find(|category| category.id == id)
            .ok_or(SessionError::UnknownCategory(id))
    }

    fn fail_load(
        &self,
        session: &mut QuizSession,
        token: LoadToken,
        error: SessionError,
    ) -> Result<(), SessionError> {
        match session.fail_loading(token, error.to_string()) {
            Ok(()) => {
                self.inner.publish(session);
                Err(error)
            }
            // A restart raced the load; the failure belongs to a dead one.
            Err(SessionError::StaleLoad) => Ok(()),
            Err(other) => Err(other),
        }
    }
}

impl ControllerInner {
    pub(crate) fn lock_session(&self) -> Result<MutexGuard<'_, QuizSession>, SessionError> {
        self.session
            .lock()
            .map_err(|error| SessionError::Lock(error.to_string()))
    }

    pub(crate) fn publish(&self, session: &QuizSession) {
        self.publisher.send_replace(session.snapshot());
    }

    pub(crate) fn install_timer(&self, handle: TimerHandle) -> Result<(), SessionError> {
        let mut slot = self
            .timer
            .lock()
            .map_err(|error| SessionError::Lock(error.to_string()))?;
        *slot = Some(handle);
        Ok(())
    }

    pub(crate) fn clear_timer(&self) -> Result<(), SessionError> {
        let mut slot = self
            .timer
            .lock()
            .map_err(|error| SessionError::Lock(error.to_string()))?;
        *slot = None;
        Ok(())
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub(crate) fn tick_interval(&self) -> Duration {
        self.rules.tick_interval()
    }

    fn cached_categories(&self) -> Result<Option<Vec<Category>>, SessionError> {
        let cache = self
            .categories
            .lock()
            .map_err(|error| SessionError::Lock(error.to_string()))?;
        Ok(cache.clone())
    }

    fn store_categories(&self, categories: Vec<Category>) -> Result<(), SessionError> {
        let mut cache = self
            .categories
            .lock()
            .map_err(|error| SessionError::Lock(error.to_string()))?;
        *cache = Some(categories);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use provider::{InMemorySource, ProviderError};
    use trivia_core::model::RawQuestion;
    use trivia_core::time::fixed_clock;

    fn seeded_source(n: usize) -> InMemorySource {
        let source = InMemorySource::new();
        let questions = (0..n)
            .map(|i| RawQuestion {
                question: format!("Q{i}"),
                correct_answer: format!("A{i}"),
                incorrect_answers: vec![format!("B{i}"), format!("C{i}"), format!("D{i}")],
            })
            .collect();
        source
            .insert_category(Category::new(CategoryId::new(9), "General Knowledge"), questions)
            .unwrap();
        source
    }

    struct FailingSource;

    #[async_trait]
    impl QuestionSource for FailingSource {
        async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
            Err(ProviderError::Api { code: 5 })
        }

        async fn fetch_question_set(
            &self,
            _category: CategoryId,
            _amount: u8,
        ) -> Result<Vec<RawQuestion>, ProviderError> {
            Err(ProviderError::Api { code: 5 })
        }
    }

    #[tokio::test]
    async fn categories_are_fetched_once_and_cached() {
        let source = seeded_source(5);
        let controller =
            QuizController::new(Arc::new(source.clone()), QuizRules::default(), fixed_clock());

        let first = controller.categories().await.unwrap();
        assert_eq!(first.len(), 1);

        // Later provider changes are invisible through the cache.
        source
            .insert_category(Category::new(CategoryId::new(18), "Computers"), Vec::new())
            .unwrap();
        let second = controller.categories().await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn category_fetch_failure_leaves_the_session_idle() {
        let controller =
            QuizController::new(Arc::new(FailingSource), QuizRules::default(), fixed_clock());

        let err = controller.categories().await.unwrap_err();
        assert!(matches!(err, SessionError::Fetch(_)));
        assert_eq!(controller.snapshot().phase, crate::session::PhaseKind::Idle);

        // The failure is per-call: selection reports it too, without a
        // phase change, because the category list itself is unavailable.
        let err = controller.select_category(CategoryId::new(9)).await.unwrap_err();
        assert!(matches!(err, SessionError::Fetch(_)));
        assert_eq!(controller.snapshot().phase, crate::session::PhaseKind::Idle);
    }

    #[tokio::test]
    async fn unknown_category_is_rejected_without_a_phase_change() {
        let controller = QuizController::new(
            Arc::new(seeded_source(5)),
            QuizRules::default(),
            fixed_clock(),
        );

        let err = controller.select_category(CategoryId::new(42)).await.unwrap_err();
        assert!(matches!(err, SessionError::UnknownCategory(id) if id == CategoryId::new(42)));
        assert_eq!(controller.snapshot().phase, crate::session::PhaseKind::Idle);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Notify, watch};

use engine::{PhaseKind, QuizController, QuizRules, SessionError, SessionSnapshot};
use provider::{InMemorySource, ProviderError, QuestionSource};
use trivia_core::model::{AnswerRecord, Category, CategoryId, RawQuestion};
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
        .insert_category(
            Category::new(CategoryId::new(9), "General Knowledge"),
            questions,
        )
        .unwrap();
    source
}

fn build_controller(n: usize) -> QuizController {
    QuizController::new(Arc::new(seeded_source(n)), QuizRules::default(), fixed_clock())
}

async fn wait_for(
    updates: &mut watch::Receiver<SessionSnapshot>,
    predicate: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    loop {
        {
            let snapshot = updates.borrow_and_update();
            if predicate(&snapshot) {
                return snapshot.clone();
            }
        }
        updates.changed().await.expect("controller dropped");
    }
}

#[tokio::test(start_paused = true)]
async fn full_quiz_run_scores_and_reports() {
    let controller = build_controller(5);
    let mut updates = controller.subscribe();

    controller.select_category(CategoryId::new(9)).await.unwrap();

    // Correct, wrong, timed out, correct, correct.
    controller.select_answer("A0").unwrap();
    controller.advance().unwrap();

    controller.select_answer("B1").unwrap();
    controller.advance().unwrap();

    wait_for(&mut updates, |s| s.current_index == 3).await;

    controller.select_answer("A3").unwrap();
    controller.advance().unwrap();

    controller.select_answer("A4").unwrap();
    controller.advance().unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Complete);
    let report = snapshot.report.expect("completed session has a report");
    assert_eq!(report.score(), 3);
    assert_eq!(report.total(), 5);
    let flags: Vec<bool> = report.entries().iter().map(|e| e.was_correct).collect();
    assert_eq!(flags, vec![true, false, false, true, true]);
    assert_eq!(report.entries()[2].correct_answer, "A2");
}

#[tokio::test(start_paused = true)]
async fn first_answer_wins_at_the_controller() {
    let controller = build_controller(5);
    controller.select_category(CategoryId::new(9)).await.unwrap();

    controller.select_answer("B0").unwrap();
    controller.select_answer("A0").unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.selected_answer.as_deref(), Some("B0"));
    assert!(snapshot.answer_locked);

    controller.advance().unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.records, vec![AnswerRecord::new(0, false)]);
    assert_eq!(snapshot.score, 0);
}

#[tokio::test(start_paused = true)]
async fn advance_without_a_selection_is_a_rejected_no_op() {
    let controller = build_controller(5);
    controller.select_category(CategoryId::new(9)).await.unwrap();

    let err = controller.advance().unwrap_err();
    assert!(matches!(err, SessionError::NoAnswerSelected));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.current_index, 0);
    assert!(snapshot.records.is_empty());
    assert_eq!(snapshot.timer_seconds, 10);
}

#[tokio::test(start_paused = true)]
async fn restart_returns_to_a_fresh_session() {
    let controller = build_controller(5);
    controller.select_category(CategoryId::new(9)).await.unwrap();
    controller.select_answer("A0").unwrap();
    controller.advance().unwrap();

    controller.restart().unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Idle);
    assert!(snapshot.records.is_empty());
    assert!(snapshot.category.is_none());

    controller.select_category(CategoryId::new(9)).await.unwrap();
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::InProgress);
    assert_eq!(snapshot.current_index, 0);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.timer_seconds, 10);
}

#[tokio::test(start_paused = true)]
async fn questions_arrive_decoded_and_shuffled() {
    let source = InMemorySource::new();
    source
        .insert_category(
            Category::new(CategoryId::new(9), "General Knowledge"),
            vec![RawQuestion {
                question: "Who wrote &quot;Hamlet&quot;?".into(),
                correct_answer: "Shakespeare".into(),
                incorrect_answers: vec!["Marlowe".into(), "Jonson".into(), "Bacon".into()],
            }],
        )
        .unwrap();
    let controller =
        QuizController::new(Arc::new(source), QuizRules::default(), fixed_clock());

    controller.select_category(CategoryId::new(9)).await.unwrap();

    let snapshot = controller.snapshot();
    let question = snapshot.current_question().expect("first question on screen");
    assert_eq!(question.text(), "Who wrote \"Hamlet\"?");
    let mut answers = question.answers().to_vec();
    answers.sort();
    assert_eq!(answers, vec!["Bacon", "Jonson", "Marlowe", "Shakespeare"]);
}

#[tokio::test(start_paused = true)]
async fn short_question_sets_are_accepted_as_is() {
    let controller = build_controller(3);
    controller.select_category(CategoryId::new(9)).await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.question_total(), 3);

    for i in 0..3 {
        controller.select_answer(&format!("A{i}")).unwrap();
        controller.advance().unwrap();
    }
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Complete);
    assert_eq!(snapshot.report.expect("report").score(), 3);
}

//
// ─── PROVIDER FAILURE AND RACE SCENARIOS ───────────────────────────────────────
//

struct StalledSource {
    categories: Vec<Category>,
}

#[async_trait]
impl QuestionSource for StalledSource {
    async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
        Ok(self.categories.clone())
    }

    async fn fetch_question_set(
        &self,
        _category: CategoryId,
        _amount: u8,
    ) -> Result<Vec<RawQuestion>, ProviderError> {
        std::future::pending().await
    }
}

struct GatedSource {
    inner: InMemorySource,
    gate: Arc<Notify>,
}

#[async_trait]
impl QuestionSource for GatedSource {
    async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.inner.fetch_categories().await
    }

    async fn fetch_question_set(
        &self,
        category: CategoryId,
        amount: u8,
    ) -> Result<Vec<RawQuestion>, ProviderError> {
        self.gate.notified().await;
        self.inner.fetch_question_set(category, amount).await
    }
}

struct FlakySource {
    categories: Vec<Category>,
}

#[async_trait]
impl QuestionSource for FlakySource {
    async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
        Ok(self.categories.clone())
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
async fn commands_are_rejected_while_loading() {
    let source = Arc::new(StalledSource {
        categories: vec![Category::new(CategoryId::new(9), "General Knowledge")],
    });
    let controller = QuizController::new(source, QuizRules::default(), fixed_clock());
    let mut updates = controller.subscribe();

    let background = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.select_category(CategoryId::new(9)).await })
    };
    wait_for(&mut updates, |s| s.phase == PhaseKind::Loading).await;

    let err = controller.select_category(CategoryId::new(9)).await.unwrap_err();
    assert!(matches!(err, SessionError::LoadInFlight));
    let err = controller.select_answer("A0").unwrap_err();
    assert!(matches!(err, SessionError::NotInProgress));
    let err = controller.advance().unwrap_err();
    assert!(matches!(err, SessionError::NotInProgress));

    background.abort();
}

#[tokio::test]
async fn restart_discards_an_in_flight_load() {
    let gate = Arc::new(Notify::new());
    let source = GatedSource {
        inner: seeded_source(5),
        gate: Arc::clone(&gate),
    };
    let controller =
        QuizController::new(Arc::new(source), QuizRules::default(), fixed_clock());
    let mut updates = controller.subscribe();

    let background = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.select_category(CategoryId::new(9)).await })
    };
    wait_for(&mut updates, |s| s.phase == PhaseKind::Loading).await;

    controller.restart().unwrap();
    gate.notify_one();

    // The late commit detects the restart and discards itself silently.
    let result = background.await.expect("select task panicked");
    assert!(result.is_ok());
    assert_eq!(controller.snapshot().phase, PhaseKind::Idle);
}

#[tokio::test]
async fn failed_fetch_moves_the_session_to_failed() {
    let source = Arc::new(FlakySource {
        categories: vec![Category::new(CategoryId::new(9), "General Knowledge")],
    });
    let controller = QuizController::new(source, QuizRules::default(), fixed_clock());

    let err = controller.select_category(CategoryId::new(9)).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Fetch(ProviderError::Api { code: 5 })
    ));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, PhaseKind::Failed);
    let message = snapshot.error.expect("failed phase carries a message");
    assert!(message.contains("rate limited"), "unexpected message: {message}");

    controller.restart().unwrap();
    assert_eq!(controller.snapshot().phase, PhaseKind::Idle);
}

#[tokio::test]
async fn empty_question_set_fails_the_load() {
    let source = InMemorySource::new();
    source
        .insert_category(Category::new(CategoryId::new(31), "Anime"), Vec::new())
        .unwrap();
    let controller =
        QuizController::new(Arc::new(source), QuizRules::default(), fixed_clock());

    let err = controller.select_category(CategoryId::new(31)).await.unwrap_err();
    assert!(matches!(err, SessionError::Fetch(ProviderError::EmptySet)));
    assert_eq!(controller.snapshot().phase, PhaseKind::Failed);
}

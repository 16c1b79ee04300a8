use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use trivia_core::model::{Category, CategoryId, RawQuestion};

/// Errors surfaced by question sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("trivia API request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("trivia API error (code {code}): {}", api_reason(*code))]
    Api { code: u8 },

    #[error("provider returned no questions")]
    EmptySet,

    #[error("provider state unavailable: {0}")]
    Unavailable(String),
}

fn api_reason(code: u8) -> &'static str {
    match code {
        1 => "not enough questions for the request",
        2 => "invalid request parameter",
        3 => "session token not found",
        4 => "session token exhausted",
        5 => "rate limited",
        _ => "unknown response code",
    }
}

/// Contract for the external trivia provider.
///
/// The quiz engine only ever talks to this trait; the wire protocol, retry
/// behavior, and caching of a concrete provider stay behind it.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the full category list.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the provider cannot be reached or
    /// answers with an error.
    async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError>;

    /// Fetch up to `amount` multiple-choice questions for one category.
    ///
    /// Question text and answers are still entity-encoded; decoding is the
    /// caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::EmptySet` when the category has no
    /// questions, and other `ProviderError` variants for transport or
    /// provider failures.
    async fn fetch_question_set(
        &self,
        category: CategoryId,
        amount: u8,
    ) -> Result<Vec<RawQuestion>, ProviderError>;
}

/// Simple in-memory question source for tests and offline prototyping.
#[derive(Clone, Default)]
pub struct InMemorySource {
    categories: Arc<Mutex<Vec<Category>>>,
    questions: Arc<Mutex<HashMap<CategoryId, Vec<RawQuestion>>>>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            categories: Arc::new(Mutex::new(Vec::new())),
            questions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a category together with its question pool.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Unavailable` if the internal state is
    /// poisoned.
    pub fn insert_category(
        &self,
        category: Category,
        questions: Vec<RawQuestion>,
    ) -> Result<(), ProviderError> {
        let mut cats = self
            .categories
            .lock()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        let mut pools = self
            .questions
            .lock()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        pools.insert(category.id, questions);
        cats.retain(|c| c.id != category.id);
        cats.push(category);
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for InMemorySource {
    async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
        let guard = self
            .categories
            .lock()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn fetch_question_set(
        &self,
        category: CategoryId,
        amount: u8,
    ) -> Result<Vec<RawQuestion>, ProviderError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        let mut pool = guard.get(&category).cloned().unwrap_or_default();
        pool.truncate(usize::from(amount));
        if pool.is_empty() {
            return Err(ProviderError::EmptySet);
        }
        Ok(pool)
    }
}

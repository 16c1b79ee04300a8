use std::env;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use trivia_core::model::{Category, CategoryId, RawQuestion};

use crate::source::{ProviderError, QuestionSource};

const DEFAULT_BASE_URL: &str = "https://opentdb.com";

#[derive(Clone, Debug)]
pub struct OpenTriviaConfig {
    pub base_url: String,
}

impl Default for OpenTriviaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
        }
    }
}

impl OpenTriviaConfig {
    /// Read the configuration from the environment.
    ///
    /// `TRIVIA_API_BASE_URL` overrides the provider endpoint; values that do
    /// not parse as an absolute URL fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("TRIVIA_API_BASE_URL")
            .ok()
            .filter(|value| Url::parse(value).is_ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Self { base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Open Trivia DB client.
///
/// Thin transport adapter: it speaks the provider's two endpoints and maps
/// its response codes into `ProviderError`. No retries, no caching.
#[derive(Clone)]
pub struct OpenTriviaClient {
    client: Client,
    config: OpenTriviaConfig,
}

impl OpenTriviaClient {
    #[must_use]
    pub fn new(config: OpenTriviaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(OpenTriviaConfig::from_env())
    }
}

#[async_trait]
impl QuestionSource for OpenTriviaClient {
    async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
        let url = self.config.endpoint("api_category.php");
        debug!("fetching categories from {url}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: CategoriesResponse = response.json().await?;
        Ok(body.trivia_categories)
    }

    async fn fetch_question_set(
        &self,
        category: CategoryId,
        amount: u8,
    ) -> Result<Vec<RawQuestion>, ProviderError> {
        let url = self.config.endpoint("api.php");
        debug!("fetching {amount} questions for category {category} from {url}");

        let response = self
            .client
            .get(url)
            .query(&[
                ("amount", amount.to_string()),
                ("category", category.to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: QuestionsResponse = response.json().await?;
        map_questions_response(body)
    }
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    trivia_categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    response_code: u8,
    results: Vec<RawQuestion>,
}

fn map_questions_response(body: QuestionsResponse) -> Result<Vec<RawQuestion>, ProviderError> {
    match body.response_code {
        0 if body.results.is_empty() => Err(ProviderError::EmptySet),
        0 => Ok(body.results),
        1 => Err(ProviderError::EmptySet),
        code => Err(ProviderError::Api { code }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_response_parses_provider_json() {
        let raw = r#"{
            "trivia_categories": [
                {"id": 9, "name": "General Knowledge"},
                {"id": 18, "name": "Science: Computers"}
            ]
        }"#;
        let body: CategoriesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.trivia_categories.len(), 2);
        assert_eq!(body.trivia_categories[1].id, CategoryId::new(18));
    }

    #[test]
    fn questions_response_parses_provider_json() {
        let raw = r#"{
            "response_code": 0,
            "results": [{
                "category": "Science: Computers",
                "type": "multiple",
                "difficulty": "medium",
                "question": "What does CPU stand for?",
                "correct_answer": "Central Processing Unit",
                "incorrect_answers": [
                    "Central Process Unit",
                    "Computer Personal Unit",
                    "Central Processor Unit"
                ]
            }]
        }"#;
        let body: QuestionsResponse = serde_json::from_str(raw).unwrap();
        let questions = map_questions_response(body).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, "Central Processing Unit");
    }

    #[test]
    fn no_results_code_maps_to_empty_set() {
        let body = QuestionsResponse {
            response_code: 1,
            results: Vec::new(),
        };
        assert!(matches!(
            map_questions_response(body),
            Err(ProviderError::EmptySet)
        ));
    }

    #[test]
    fn empty_results_with_success_code_maps_to_empty_set() {
        let body = QuestionsResponse {
            response_code: 0,
            results: Vec::new(),
        };
        assert!(matches!(
            map_questions_response(body),
            Err(ProviderError::EmptySet)
        ));
    }

    #[test]
    fn other_codes_map_to_api_error() {
        let body = QuestionsResponse {
            response_code: 2,
            results: Vec::new(),
        };
        assert!(matches!(
            map_questions_response(body),
            Err(ProviderError::Api { code: 2 })
        ));
    }

    #[test]
    fn config_endpoint_tolerates_trailing_slash() {
        let config = OpenTriviaConfig {
            base_url: "https://opentdb.com/".into(),
        };
        assert_eq!(
            config.endpoint("api_category.php"),
            "https://opentdb.com/api_category.php"
        );
    }
}

#![forbid(unsafe_code)]

pub mod opentdb;
pub mod source;

pub use opentdb::{OpenTriviaClient, OpenTriviaConfig};
pub use source::{InMemorySource, ProviderError, QuestionSource};

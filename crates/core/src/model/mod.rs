mod category;
mod ids;
mod question;
mod record;
mod report;

pub use category::Category;
pub use ids::{CategoryId, ParseIdError};
pub use question::{Question, QuestionError, QuestionSet, QuestionSetError, RawQuestion};
pub use record::AnswerRecord;
pub use report::{ReportEntry, ReportError, SessionReport};

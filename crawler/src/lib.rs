pub mod extract;
pub mod fetch;

pub use extract::{parse_question, question_links, QuestionPage, SkipReason};
pub use fetch::{Fetcher, FetchConfig};

pub mod error;
pub mod index;
pub mod prompt;
pub mod question;
pub mod source;

pub use error::{ContextError, Result};
pub use index::{AnalysisRecord, ContextIndex, IndexKey};
pub use prompt::build_prompt;
pub use question::QuestionRecord;

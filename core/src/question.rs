use serde::{Deserialize, Serialize};

/// Index stored in `spravna` when the correct answer could not be determined.
pub const UNKNOWN_ANSWER: i32 = -1;

/// One scraped test question, as written to `okruhN.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Eight-digit question number.
    pub id: String,
    pub otazka: String,
    /// Absolute URL of the question image, when one exists.
    pub obrazek: Option<String>,
    /// Answer texts; an answer shown as a picture is stored as the picture's URL.
    pub moznosti: Vec<String>,
    pub spravna: i32,
}

impl QuestionRecord {
    pub fn correct_option(&self) -> Option<&str> {
        usize::try_from(self.spravna)
            .ok()
            .and_then(|i| self.moznosti.get(i))
            .map(String::as_str)
    }
}

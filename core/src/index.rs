use crate::error::{ContextError, Result};
use crate::source::{read_document, resolve_sources};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const RESULTS_KEY: &str = "výsledky_okruhu";
const QUESTION_ID_KEY: &str = "id_otazky";
const MEDIA_KEY: &str = "url";
const ADDRESS_KEY: &str = "adresa";
const ANALYSIS_KEY: &str = "analyza";

pub const SUMMARY_KEY: &str = "shrnuti";
pub const FINDINGS_KEY: &str = "poznatky_relevantni_k_odpovedim";

/// Analysis of one image or video. Unknown keys are kept as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisRecord(Map<String, Value>);

impl AnalysisRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw `shrnuti` value, if present.
    pub fn summary(&self) -> Option<&Value> {
        self.0.get(SUMMARY_KEY)
    }

    /// `poznatky_relevantni_k_odpovedim`; empty when absent or not a list.
    pub fn findings(&self) -> &[Value] {
        match self.0.get(FINDINGS_KEY) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub question_id: String,
    pub url: String,
}

impl IndexKey {
    pub fn new(question_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self { question_id: question_id.into(), url: url.into() }
    }
}

/// Lookup table from (question id, media address) to the analysis of that media.
///
/// Entries keep the position of their first insertion; a later document that
/// defines the same key replaces the analysis in place.
#[derive(Debug, Clone, Default)]
pub struct ContextIndex {
    slots: HashMap<IndexKey, usize>,
    entries: Vec<(IndexKey, AnalysisRecord)>,
}

impl ContextIndex {
    /// Build the index from files and/or directories of `.json` documents.
    pub fn load<I, P>(locations: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let locations: Vec<PathBuf> = locations.into_iter().map(|p| p.as_ref().to_path_buf()).collect();
        let files = resolve_sources(&locations);
        if files.is_empty() {
            return Err(ContextError::Configuration { locations });
        }

        let mut index = Self::default();
        for file in &files {
            let document = read_document(file)?;
            let added = index.ingest(&document);
            tracing::debug!(path = %file.display(), entries = added, "loaded analysis document");
        }
        tracing::info!(documents = files.len(), entries = index.len(), "context index built");
        Ok(index)
    }

    /// Build the index from already parsed documents, in order.
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut index = Self::default();
        for document in documents {
            index.ingest(document);
        }
        index
    }

    fn ingest(&mut self, document: &Value) -> usize {
        let mut added = 0;
        let items = document.get(RESULTS_KEY).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
        for item in items {
            let question_id = item.get(QUESTION_ID_KEY).and_then(Value::as_str).unwrap_or_default();
            let media = item.get(MEDIA_KEY).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
            for entry in media {
                let url = entry.get(ADDRESS_KEY).and_then(Value::as_str).unwrap_or_default();
                if let Some(analysis) = indexable(question_id, url, entry.get(ANALYSIS_KEY)) {
                    self.insert(IndexKey::new(question_id, url), AnalysisRecord::new(analysis.clone()));
                    added += 1;
                }
            }
        }
        added
    }

    fn insert(&mut self, key: IndexKey, record: AnalysisRecord) {
        match self.slots.get(&key) {
            Some(&slot) => self.entries[slot].1 = record,
            None => {
                self.slots.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
            }
        }
    }

    /// Find the analysis for a question and/or media address.
    ///
    /// With both given only the exact pair matches. With one given, the first
    /// entry in index order matching that field is returned. Empty strings
    /// count as not given.
    pub fn get_context(&self, question_id: Option<&str>, url: Option<&str>) -> Option<&AnalysisRecord> {
        let question_id = question_id.filter(|s| !s.is_empty());
        let url = url.filter(|s| !s.is_empty());
        match (question_id, url) {
            (Some(qid), Some(u)) => self.get(&IndexKey::new(qid, u)),
            (Some(qid), None) => self.find(|key| key.question_id == qid),
            (None, Some(u)) => self.find(|key| key.url == u),
            (None, None) => None,
        }
    }

    pub fn get(&self, key: &IndexKey) -> Option<&AnalysisRecord> {
        self.slots.get(key).map(|&slot| &self.entries[slot].1)
    }

    fn find(&self, pred: impl Fn(&IndexKey) -> bool) -> Option<&AnalysisRecord> {
        self.entries.iter().find(|(key, _)| pred(key)).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &AnalysisRecord)> {
        self.entries.iter().map(|(key, record)| (key, record))
    }

    /// Distinct question ids in index order.
    pub fn question_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|(key, _)| key.question_id.as_str())
            .filter(|qid| seen.insert(*qid))
            .collect()
    }
}

/// An entry is indexed only when id, address and a non-empty analysis object are all present.
fn indexable<'a>(question_id: &str, url: &str, analysis: Option<&'a Value>) -> Option<&'a Map<String, Value>> {
    if question_id.is_empty() || url.is_empty() {
        return None;
    }
    analysis.and_then(Value::as_object).filter(|fields| !fields.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(entries: Value) -> Value {
        json!({ "výsledky_okruhu": entries })
    }

    #[test]
    fn partial_entries_are_dropped() {
        let d = doc(json!([
            { "id_otazky": "Q1", "url": [
                { "adresa": "U1", "analyza": { "shrnuti": "a" } },
                { "adresa": "U2", "analyza": null },
                { "adresa": "", "analyza": { "shrnuti": "b" } },
                { "adresa": "U3", "analyza": {} },
                { "adresa": "U4" }
            ]},
            { "url": [ { "adresa": "U5", "analyza": { "shrnuti": "c" } } ] },
            { "id_otazky": "Q2" }
        ]));
        let index = ContextIndex::from_documents([&d]);
        assert_eq!(index.len(), 1);
        assert!(index.get(&IndexKey::new("Q1", "U1")).is_some());
    }

    #[test]
    fn wrong_field_types_count_as_absent() {
        let d = doc(json!([
            { "id_otazky": 42, "url": [ { "adresa": "U1", "analyza": { "shrnuti": "a" } } ] },
            { "id_otazky": "Q1", "url": "U1" },
            { "id_otazky": "Q2", "url": [ { "adresa": "U2", "analyza": "text" } ] }
        ]));
        assert!(ContextIndex::from_documents([&d]).is_empty());
        assert!(ContextIndex::from_documents([&json!([1, 2, 3])]).is_empty());
        assert!(ContextIndex::from_documents([&json!({})]).is_empty());
    }

    #[test]
    fn overwrite_keeps_first_position() {
        let first = doc(json!([
            { "id_otazky": "Q1", "url": [
                { "adresa": "U1", "analyza": { "shrnuti": "old" } },
                { "adresa": "U2", "analyza": { "shrnuti": "second" } }
            ]}
        ]));
        let second = doc(json!([
            { "id_otazky": "Q1", "url": [ { "adresa": "U1", "analyza": { "shrnuti": "new" } } ] }
        ]));
        let index = ContextIndex::from_documents([&first, &second]);
        assert_eq!(index.len(), 2);
        let ctx = index.get_context(Some("Q1"), None).unwrap();
        assert_eq!(ctx.summary(), Some(&json!("new")));

        let listed: Vec<_> = index
            .iter()
            .map(|(key, record)| (key.url.as_str(), record.summary().cloned()))
            .collect();
        assert_eq!(listed, vec![("U1", Some(json!("new"))), ("U2", Some(json!("second")))]);
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let d = doc(json!([
            { "id_otazky": "Q1", "url": [ { "adresa": "U1", "analyza": { "shrnuti": "a" } } ] }
        ]));
        let index = ContextIndex::from_documents([&d]);
        assert!(index.get_context(Some(""), Some("")).is_none());
        assert!(index.get_context(Some("Q1"), Some("")).is_some());
        assert!(index.get_context(Some(""), Some("U1")).is_some());
    }

    #[test]
    fn question_ids_are_distinct_and_ordered() {
        let d = doc(json!([
            { "id_otazky": "Q2", "url": [
                { "adresa": "U1", "analyza": { "shrnuti": "a" } },
                { "adresa": "U2", "analyza": { "shrnuti": "b" } }
            ]},
            { "id_otazky": "Q1", "url": [ { "adresa": "U3", "analyza": { "shrnuti": "c" } } ] }
        ]));
        let index = ContextIndex::from_documents([&d]);
        assert_eq!(index.question_ids(), vec!["Q2", "Q1"]);
    }

    #[test]
    fn record_accessors() {
        let record: AnalysisRecord = serde_json::from_value(json!({
            "shrnuti": "s",
            "poznatky_relevantni_k_odpovedim": "not a list",
            "extra": 1
        }))
        .unwrap();
        assert_eq!(record.summary(), Some(&json!("s")));
        assert!(record.findings().is_empty());
        assert_eq!(record.get("extra"), Some(&json!(1)));
        assert_eq!(serde_json::to_value(&record).unwrap()["extra"], json!(1));
    }
}

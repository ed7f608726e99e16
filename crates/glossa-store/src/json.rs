//! JSON-document record store.
//!
//! One file holds the whole store. Every mutation appends in memory and
//! rewrites the full document, so after any successful call the file is a
//! complete, consistent snapshot. O(n) per write, acceptable at this
//! workload's write volume.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use glossa_core::record::{ProcessingResult, StoredResult, TaskKind, TextSample};

use crate::StoreError;

const DOCUMENT_VERSION: &str = "1.0";

/// The persisted document structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub text_samples: Vec<TextSample>,
    pub processing_results: Vec<StoredResult>,
    pub metadata: StoreMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub created: DateTime<Utc>,
    pub version: String,
}

impl StoreDocument {
    fn empty() -> Self {
        Self {
            text_samples: Vec::new(),
            processing_results: Vec::new(),
            metadata: StoreMetadata {
                created: Utc::now(),
                version: DOCUMENT_VERSION.to_string(),
            },
        }
    }
}

/// Durable, append-only store for text samples and processing results.
///
/// The backing file is exclusively owned by this instance; mutating calls
/// take `&mut self`, which serializes writers and keeps id assignment
/// race-free.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl JsonStore {
    /// Open the store at `path`, loading the existing document or starting
    /// an empty one if the file is absent.
    ///
    /// A present-but-malformed document fails with [`StoreError::Corrupt`]
    /// and is left untouched on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let doc: StoreDocument =
                serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            info!(
                path = %path.display(),
                samples = doc.text_samples.len(),
                results = doc.processing_results.len(),
                "opened record store"
            );
            doc
        } else {
            debug!(path = %path.display(), "starting empty record store");
            StoreDocument::empty()
        };
        Ok(Self { path, doc })
    }

    /// Append a text sample and persist. Returns the assigned id.
    pub fn add_text_sample(
        &mut self,
        text: &str,
        language: &str,
        category: &str,
    ) -> Result<u64, StoreError> {
        let id = next_id(self.doc.text_samples.iter().map(|s| s.id));
        self.doc.text_samples.push(TextSample {
            id,
            text: text.to_string(),
            language: language.to_string(),
            category: category.to_string(),
            created: Utc::now(),
        });
        self.save_all()?;
        Ok(id)
    }

    /// Append a processing result and persist. The task payload is
    /// serialized to a portable JSON string. Returns the assigned id.
    pub fn add_processing_result(&mut self, result: &ProcessingResult) -> Result<u64, StoreError> {
        let id = next_id(self.doc.processing_results.iter().map(|r| r.id));
        let payload = serde_json::to_string(&result.output)?;
        self.doc.processing_results.push(StoredResult {
            id,
            text: result.text.clone(),
            language: result.language.clone(),
            task: result.task,
            result: payload,
            confidence: result.confidence,
            timestamp: result.timestamp,
        });
        self.save_all()?;
        Ok(id)
    }

    /// All samples in insertion order, optionally filtered by exact
    /// language-code match.
    pub fn text_samples(&self, language: Option<&str>) -> Vec<&TextSample> {
        self.doc
            .text_samples
            .iter()
            .filter(|s| language.is_none_or(|l| s.language == l))
            .collect()
    }

    /// All results in insertion order, optionally filtered by task.
    pub fn processing_results(&self, task: Option<TaskKind>) -> Vec<&StoredResult> {
        self.doc
            .processing_results
            .iter()
            .filter(|r| task.is_none_or(|t| r.task == t))
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.doc.text_samples.len()
    }

    pub fn result_count(&self) -> usize {
        self.doc.processing_results.len()
    }

    /// The in-memory document, as it would be persisted.
    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full-document rewrite of the backing file.
    fn save_all(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.doc)?;
        fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::record::{SentimentRating, TaskOutput};
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path().join("db.json")).unwrap();
        (dir, store)
    }

    fn sentiment_result(text: &str, score: f32) -> ProcessingResult {
        ProcessingResult {
            text: text.to_string(),
            language: "auto-detected".into(),
            task: TaskKind::Sentiment,
            output: TaskOutput::Sentiment {
                ratings: vec![SentimentRating {
                    label: "POSITIVE".into(),
                    score,
                }],
            },
            confidence: score,
            timestamp: Utc::now(),
        }
    }

    fn entities_result(text: &str) -> ProcessingResult {
        ProcessingResult {
            text: text.to_string(),
            language: "auto-detected".into(),
            task: TaskKind::Ner,
            output: TaskOutput::Entities { spans: vec![] },
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn fresh_store_is_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.sample_count(), 0);
        assert_eq!(store.result_count(), 0);
        assert_eq!(store.document().metadata.version, "1.0");
    }

    #[test]
    fn sample_ids_are_sequential_from_one() {
        let (_dir, mut store) = temp_store();
        for n in 1..=5u64 {
            let id = store.add_text_sample(&format!("text {n}"), "en", "general").unwrap();
            assert_eq!(id, n);
        }
        let samples = store.text_samples(None);
        assert_eq!(samples.len(), 5);
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(s.id, i as u64 + 1);
            assert_eq!(s.text, format!("text {}", i + 1));
        }
    }

    #[test]
    fn samples_filter_by_exact_language() {
        let (_dir, mut store) = temp_store();
        store.add_text_sample("hello", "en", "general").unwrap();
        store.add_text_sample("hola", "es", "general").unwrap();
        store.add_text_sample("world", "en", "general").unwrap();

        let en = store.text_samples(Some("en"));
        assert_eq!(en.len(), 2);
        assert_eq!(en[0].text, "hello");
        assert_eq!(en[1].text, "world");

        assert!(store.text_samples(Some("de")).is_empty());
    }

    #[test]
    fn results_filter_by_task_preserving_order() {
        let (_dir, mut store) = temp_store();
        store.add_processing_result(&sentiment_result("a", 0.9)).unwrap();
        store.add_processing_result(&entities_result("b")).unwrap();
        store.add_processing_result(&sentiment_result("c", 0.8)).unwrap();

        let sentiment = store.processing_results(Some(TaskKind::Sentiment));
        assert_eq!(sentiment.len(), 2);
        assert_eq!(sentiment[0].text, "a");
        assert_eq!(sentiment[1].text, "c");

        assert!(store.processing_results(Some(TaskKind::Classification)).is_empty());
        assert_eq!(store.processing_results(None).len(), 3);
    }

    #[test]
    fn result_payload_is_serialized_text() {
        let (_dir, mut store) = temp_store();
        let result = sentiment_result("great", 0.95);
        let id = store.add_processing_result(&result).unwrap();
        assert_eq!(id, 1);

        let stored = store.processing_results(None)[0];
        assert_eq!(stored.confidence, 0.95);
        let parsed: TaskOutput = serde_json::from_str(&stored.result).unwrap();
        assert_eq!(parsed, result.output);
    }

    #[test]
    fn reopen_round_trips_the_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        let mut store = JsonStore::open(&path).unwrap();
        store.add_text_sample("Hello world", "en", "general").unwrap();
        store.add_processing_result(&sentiment_result("great", 0.95)).unwrap();
        let before = store.document().clone();

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(*reopened.document(), before);
    }

    #[test]
    fn ids_continue_after_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        let mut store = JsonStore::open(&path).unwrap();
        store.add_text_sample("one", "en", "general").unwrap();
        store.add_text_sample("two", "en", "general").unwrap();
        drop(store);

        let mut store = JsonStore::open(&path).unwrap();
        let id = store.add_text_sample("three", "en", "general").unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn corrupt_document_is_surfaced_not_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        // The file is left as it was.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn file_is_complete_snapshot_after_each_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        let mut store = JsonStore::open(&path).unwrap();
        store.add_text_sample("one", "en", "general").unwrap();

        let on_disk: StoreDocument =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, *store.document());
    }
}

//! `TextProcessor`: the one object callers talk to.
//!
//! Construction is the single Uninitialized → Ready transition: a
//! `TextProcessor` that exists is ready, and there is no teardown state.
//! Every task operation runs invoke → normalize → persist and only touches
//! the store after the backend call fully succeeded.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, error, info};

use glossa_ai::{BackendConfig, InvokeOptions, Registry};
use glossa_core::config::{AUTO_DETECTED, EngineConfig, SUPPORTED_LANGUAGES};
use glossa_core::record::{ProcessingResult, StoredResult, TaskKind, TextSample};
use glossa_core::score::derive_confidence;
use glossa_store::JsonStore;

use crate::EngineError;

/// Canonical multilingual sample set, `(text, language, category)`.
const SAMPLE_TEXTS: &[(&str, &str, &str)] = &[
    ("The economy is growing rapidly.", "en", "economy"),
    ("La economía está creciendo rápidamente.", "es", "economy"),
    ("L'économie croît rapidement.", "fr", "economy"),
    ("Die Wirtschaft wächst schnell.", "de", "economy"),
    ("L'economia sta crescendo rapidamente.", "it", "economy"),
    ("I love this new technology!", "en", "technology"),
    ("¡Me encanta esta nueva tecnología!", "es", "technology"),
    ("J'adore cette nouvelle technologie!", "fr", "technology"),
    ("The weather is beautiful today.", "en", "weather"),
    ("El clima está hermoso hoy.", "es", "weather"),
    ("Le temps est magnifique aujourd'hui.", "fr", "weather"),
    ("Das Wetter ist heute wunderschön.", "de", "weather"),
];

/// Aggregate read-only view over the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub total_samples: usize,
    pub total_results: usize,
    /// Distinct sample languages, sorted.
    pub languages: BTreeSet<String>,
    /// Distinct result task names, sorted.
    pub tasks: BTreeSet<String>,
}

/// Facade over the backend registry and the record store.
pub struct TextProcessor {
    registry: Registry,
    store: JsonStore,
}

impl TextProcessor {
    /// Open the record store and build the capability registry. A corrupt
    /// backing document aborts here; deciding between reset and abort is
    /// the caller's call.
    pub fn initialize(config: &EngineConfig) -> Result<Self, EngineError> {
        let store = JsonStore::open(&config.db_path)?;
        let registry = Registry::initialize(&BackendConfig {
            device: config.device,
            model_dir: config.model_dir.clone(),
            timeout: config.timeout,
        });
        info!(db = %config.db_path.display(), "text processor ready");
        Ok(Self { registry, store })
    }

    /// Assemble a processor from pre-built parts, e.g. a registry holding
    /// custom capabilities.
    pub fn from_parts(registry: Registry, store: JsonStore) -> Self {
        Self { registry, store }
    }

    /// Zero-shot classification of `text` against `candidate_labels`.
    ///
    /// Fails with [`EngineError::InvalidInput`] on an empty label list,
    /// before any backend or store interaction.
    pub fn classify(
        &mut self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<ProcessingResult, EngineError> {
        if candidate_labels.is_empty() {
            return Err(EngineError::InvalidInput(
                "candidate label list must not be empty".into(),
            ));
        }
        self.run_task(
            TaskKind::Classification,
            text,
            &InvokeOptions::with_labels(candidate_labels),
        )
    }

    /// Sentiment analysis; only the backend's first rating is consumed
    /// downstream.
    pub fn analyze_sentiment(&mut self, text: &str) -> Result<ProcessingResult, EngineError> {
        self.run_task(TaskKind::Sentiment, text, &InvokeOptions::default())
    }

    /// Named-entity recognition; an empty span list is a valid result.
    pub fn extract_entities(&mut self, text: &str) -> Result<ProcessingResult, EngineError> {
        self.run_task(TaskKind::Ner, text, &InvokeOptions::default())
    }

    /// One attempt, no retry: backend failures are logged and propagate
    /// without writing to the store.
    fn run_task(
        &mut self,
        task: TaskKind,
        text: &str,
        opts: &InvokeOptions,
    ) -> Result<ProcessingResult, EngineError> {
        let backend = self.registry.get(task)?;
        let output = backend.invoke(text, opts).map_err(|err| {
            error!(task = %task, backend = backend.name(), error = %err, "backend invocation failed");
            err
        })?;

        let confidence = derive_confidence(&output);
        let result = ProcessingResult {
            text: text.to_string(),
            language: AUTO_DETECTED.to_string(),
            task,
            output,
            confidence,
            timestamp: Utc::now(),
        };
        let id = self.store.add_processing_result(&result)?;
        debug!(task = %task, id, confidence, "stored processing result");
        Ok(result)
    }

    /// Ingest a text sample. Returns the assigned id.
    pub fn add_text_sample(
        &mut self,
        text: &str,
        language: &str,
        category: &str,
    ) -> Result<u64, EngineError> {
        Ok(self.store.add_text_sample(text, language, category)?)
    }

    /// Append the canonical multilingual sample set. Returns how many
    /// samples were added.
    pub fn seed_samples(&mut self) -> Result<usize, EngineError> {
        for (text, language, category) in SAMPLE_TEXTS {
            self.store.add_text_sample(text, language, category)?;
        }
        info!(count = SAMPLE_TEXTS.len(), "seeded sample texts");
        Ok(SAMPLE_TEXTS.len())
    }

    /// Samples in insertion order, optionally filtered by language.
    pub fn text_samples(&self, language: Option<&str>) -> Vec<&TextSample> {
        self.store.text_samples(language)
    }

    /// Results in insertion order, optionally filtered by task.
    pub fn processing_results(&self, task: Option<TaskKind>) -> Vec<&StoredResult> {
        self.store.processing_results(task)
    }

    /// Read-only aggregation over the store; no side effects.
    pub fn database_stats(&self) -> DatabaseStats {
        let languages = self
            .store
            .text_samples(None)
            .iter()
            .map(|s| s.language.clone())
            .collect();
        let tasks = self
            .store
            .processing_results(None)
            .iter()
            .map(|r| r.task.to_string())
            .collect();
        DatabaseStats {
            total_samples: self.store.sample_count(),
            total_results: self.store.result_count(),
            languages,
            tasks,
        }
    }

    /// The fixed list of supported language codes; static configuration,
    /// not derived from stored data.
    pub fn available_languages(&self) -> &'static [&'static str] {
        SUPPORTED_LANGUAGES
    }

    /// The capability registry snapshot this processor routes through.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glossa_ai::{Capability, InferenceError, Tier};
    use glossa_core::record::{SentimentRating, TaskOutput};
    use tempfile::TempDir;

    struct StubSentiment;

    impl Capability for StubSentiment {
        fn task(&self) -> TaskKind {
            TaskKind::Sentiment
        }

        fn name(&self) -> &str {
            "stub-sentiment"
        }

        fn invoke(&self, _text: &str, _opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
            Ok(TaskOutput::Sentiment {
                ratings: vec![SentimentRating {
                    label: "POSITIVE".into(),
                    score: 0.95,
                }],
            })
        }
    }

    struct FailingBackend(TaskKind);

    impl Capability for FailingBackend {
        fn task(&self) -> TaskKind {
            self.0
        }

        fn name(&self) -> &str {
            "failing-backend"
        }

        fn invoke(&self, _text: &str, _opts: &InvokeOptions) -> Result<TaskOutput, InferenceError> {
            Err(InferenceError::Invocation("model exploded".into()))
        }
    }

    fn temp_store(dir: &TempDir) -> JsonStore {
        JsonStore::open(dir.path().join("db.json")).unwrap()
    }

    fn stub_processor(dir: &TempDir) -> TextProcessor {
        let registry = Registry::builder()
            .with_capability(TaskKind::Sentiment, Tier::Fallback, Arc::new(StubSentiment))
            .build();
        TextProcessor::from_parts(registry, temp_store(dir))
    }

    #[test]
    fn end_to_end_sentiment_with_stubbed_backend() {
        let dir = TempDir::new().unwrap();
        let mut processor = stub_processor(&dir);

        let id = processor.add_text_sample("Hello world", "en", "general").unwrap();
        assert_eq!(id, 1);

        let before = processor.database_stats();
        let result = processor.analyze_sentiment("I love this!").unwrap();
        assert_eq!(result.task, TaskKind::Sentiment);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.language, "auto-detected");

        let after = processor.database_stats();
        assert_eq!(after.total_results, before.total_results + 1);
        assert_eq!(after.total_samples, 1);
        assert!(after.tasks.contains("sentiment"));
    }

    #[test]
    fn classify_with_empty_labels_fails_without_store_write() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::initialize(&BackendConfig::default());
        let mut processor = TextProcessor::from_parts(registry, temp_store(&dir));

        let err = processor.classify("some text", &[]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert_eq!(processor.database_stats().total_results, 0);
        // The store was never written, so no backing file exists yet.
        assert!(!dir.path().join("db.json").exists());
    }

    #[test]
    fn failed_backend_leaves_result_count_unchanged() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::builder()
            .with_capability(
                TaskKind::Ner,
                Tier::Preferred,
                Arc::new(FailingBackend(TaskKind::Ner)),
            )
            .build();
        let mut processor = TextProcessor::from_parts(registry, temp_store(&dir));

        let before = processor.database_stats().total_results;
        let err = processor.extract_entities("Marie Curie").unwrap_err();
        assert!(matches!(err, EngineError::Inference(_)));
        assert_eq!(processor.database_stats().total_results, before);
    }

    #[test]
    fn missing_task_is_backend_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut processor = stub_processor(&dir);

        let err = processor.extract_entities("anything").unwrap_err();
        assert!(matches!(err, EngineError::Registry(_)));
        assert_eq!(processor.database_stats().total_results, 0);
    }

    #[test]
    fn fallback_registry_serves_all_tasks_end_to_end() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::initialize(&BackendConfig::default());
        let mut processor = TextProcessor::from_parts(registry, temp_store(&dir));

        let labels = vec!["economy".to_string(), "sports".to_string()];
        let classified = processor.classify("The economy is growing.", &labels).unwrap();
        assert_eq!(classified.task, TaskKind::Classification);

        let sentiment = processor.analyze_sentiment("I love this!").unwrap();
        assert_eq!(sentiment.task, TaskKind::Sentiment);

        let entities = processor.extract_entities("Marie Curie lived in Paris.").unwrap();
        assert_eq!(entities.task, TaskKind::Ner);

        let stats = processor.database_stats();
        assert_eq!(stats.total_results, 3);
        assert_eq!(
            stats.tasks.iter().cloned().collect::<Vec<_>>(),
            vec!["classification", "ner", "sentiment"]
        );
    }

    #[test]
    fn empty_entity_output_is_valid_and_persisted() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::initialize(&BackendConfig::default());
        let mut processor = TextProcessor::from_parts(registry, temp_store(&dir));

        let result = processor.extract_entities("nothing capitalized here").unwrap();
        assert_eq!(result.output, TaskOutput::Entities { spans: vec![] });
        assert_eq!(result.confidence, 0.0);
        assert_eq!(processor.database_stats().total_results, 1);
    }

    #[test]
    fn seeding_loads_the_canonical_samples() {
        let dir = TempDir::new().unwrap();
        let mut processor = stub_processor(&dir);

        let added = processor.seed_samples().unwrap();
        assert_eq!(added, 12);

        let stats = processor.database_stats();
        assert_eq!(stats.total_samples, 12);
        assert_eq!(
            stats.languages.iter().cloned().collect::<Vec<_>>(),
            vec!["de", "en", "es", "fr", "it"]
        );
        assert_eq!(processor.text_samples(Some("en")).len(), 3);
    }

    #[test]
    fn results_filter_by_task_through_the_facade() {
        let dir = TempDir::new().unwrap();
        let mut processor = stub_processor(&dir);

        processor.analyze_sentiment("first").unwrap();
        processor.analyze_sentiment("second").unwrap();

        let results = processor.processing_results(Some(TaskKind::Sentiment));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "first");
        assert_eq!(results[1].text, "second");
        assert!(processor.processing_results(Some(TaskKind::Ner)).is_empty());
    }

    #[test]
    fn available_languages_are_static() {
        let dir = TempDir::new().unwrap();
        let processor = stub_processor(&dir);
        assert_eq!(processor.available_languages().len(), 10);
        assert_eq!(processor.available_languages()[0], "en");
    }
}

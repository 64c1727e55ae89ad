//! Named-entity extraction
//!
//! An [`EntityExtractor`] offers column samples to one or more pluggable
//! [`NerBackend`]s and normalizes their labels into [`Category`] values.
//! Which backends run is decided once, at construction, by probing the
//! configured transformer endpoints: when none answers, the extractor runs
//! the built-in [`LexicalTagger`] and reports itself as degraded.

pub mod http;
pub mod lexical;

pub use http::HttpNerBackend;
pub use lexical::LexicalTagger;

use crate::config::{DetectionConfig, NerConfig};
use crate::detection::models::{Category, DetectedEntity, EntityCounts};
use crate::domain::{NerError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

/// Kind of model behind a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Transformer token-classification model
    Transformer,
    /// Rule and gazetteer tagger
    Lexical,
}

/// An entity span as returned by a backend, before label normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub word: String,
    pub label: String,
    pub score: f64,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

/// Trait for pluggable NER backends
///
/// Given a text, a backend returns the spans it recognized with their raw
/// label and confidence.
#[async_trait]
pub trait NerBackend: Send + Sync {
    /// Identifier used as the `source` of produced entities
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Recognize entities in a single text
    async fn recognize(&self, text: &str) -> std::result::Result<Vec<RawEntity>, NerError>;

    /// Startup capability check
    async fn probe(&self) -> std::result::Result<(), NerError> {
        self.recognize("Health check").await.map(|_| ())
    }
}

/// Whether the extractor runs on transformer backends or on the fallback tagger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorMode {
    Full,
    Degraded,
}

impl std::fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractorMode::Full => write!(f, "full"),
            ExtractorMode::Degraded => write!(f, "degraded"),
        }
    }
}

/// Bounds applied to every extraction call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Items considered from the head of the batch
    pub max_items: usize,
    /// Prefix length, in characters, offered to the backends
    pub max_chars: usize,
    /// Texts with fewer non-whitespace characters are skipped
    pub min_chars: usize,
    /// Backend requests in flight per extraction call
    pub concurrency: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_items: 30,
            max_chars: 500,
            min_chars: 3,
            concurrency: 4,
        }
    }
}

impl From<&DetectionConfig> for ExtractionLimits {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            max_items: config.ner_max_items,
            max_chars: config.ner_max_chars,
            min_chars: config.min_text_chars,
            concurrency: config.ner_concurrency.max(1),
        }
    }
}

/// A (backend, text) pair that could not be processed
#[derive(Debug, Clone)]
pub struct BackendFailure {
    pub backend: String,
    pub row_index: usize,
    pub error: NerError,
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed on row {}: {}", self.backend, self.row_index, self.error)
    }
}

/// Outcome of one extraction call
///
/// Backend failures do not abort the batch; they are collected here next
/// to whatever the remaining (backend, text) pairs produced.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub counts: EntityCounts,
    pub entities: Vec<DetectedEntity>,
    pub failures: Vec<BackendFailure>,
}

impl Extraction {
    /// True when at least one (backend, text) pair failed
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Entity extractor over a fixed set of backends
pub struct EntityExtractor {
    backends: Vec<Arc<dyn NerBackend>>,
    mode: ExtractorMode,
    limits: ExtractionLimits,
}

impl EntityExtractor {
    /// Extractor over backends already known to be available
    pub fn new(
        backends: Vec<Arc<dyn NerBackend>>,
        mode: ExtractorMode,
        limits: ExtractionLimits,
    ) -> Self {
        Self {
            backends,
            mode,
            limits,
        }
    }

    /// Degraded extractor running only the lexical tagger
    pub fn lexical(limits: ExtractionLimits) -> Result<Self> {
        let tagger: Arc<dyn NerBackend> = Arc::new(LexicalTagger::new()?);
        Ok(Self::new(vec![tagger], ExtractorMode::Degraded, limits))
    }

    /// Probes each candidate and keeps those that answer.
    ///
    /// Falls back to the lexical tagger when no candidate is available.
    pub async fn detect(
        candidates: Vec<Arc<dyn NerBackend>>,
        limits: ExtractionLimits,
    ) -> Result<Self> {
        let probes = candidates.iter().map(|backend| async move {
            let outcome = backend.probe().await;
            (Arc::clone(backend), outcome)
        });

        let mut available = Vec::new();
        for (backend, outcome) in futures::future::join_all(probes).await {
            match outcome {
                Ok(()) => {
                    tracing::info!(backend = %backend.name(), "NER backend available");
                    available.push(backend);
                }
                Err(e) => {
                    tracing::warn!(
                        backend = %backend.name(),
                        error = %e,
                        "NER backend unavailable"
                    );
                }
            }
        }

        if available.is_empty() {
            tracing::warn!("No transformer NER backend available, running in degraded mode");
            return Self::lexical(limits);
        }

        Ok(Self::new(available, ExtractorMode::Full, limits))
    }

    /// Builds the configured HTTP backends and selects the mode.
    ///
    /// With `probe_on_startup = false` the configured backends are trusted
    /// without a capability check.
    pub async fn from_config(ner: &NerConfig, detection: &DetectionConfig) -> Result<Self> {
        let limits = ExtractionLimits::from(detection);

        let mut candidates: Vec<Arc<dyn NerBackend>> = Vec::with_capacity(ner.backends.len());
        for backend in &ner.backends {
            candidates.push(Arc::new(HttpNerBackend::new(backend)?));
        }

        if candidates.is_empty() {
            tracing::warn!("No NER backend configured, running in degraded mode");
            return Self::lexical(limits);
        }

        if ner.probe_on_startup {
            Self::detect(candidates, limits).await
        } else {
            Ok(Self::new(candidates, ExtractorMode::Full, limits))
        }
    }

    pub fn mode(&self) -> ExtractorMode {
        self.mode
    }

    pub fn is_degraded(&self) -> bool {
        self.mode == ExtractorMode::Degraded
    }

    pub fn limits(&self) -> ExtractionLimits {
        self.limits
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Extracts entities from `(row_index, text)` samples.
    ///
    /// Only the first `max_items` samples are considered. Each text is
    /// truncated to `max_chars` characters and offered to every backend;
    /// texts shorter than `min_chars` non-whitespace characters are skipped.
    /// Entities come back in sample order, then backend order.
    pub async fn extract(&self, samples: &[(usize, String)]) -> Extraction {
        let mut requests = Vec::new();
        for (row_index, text) in samples.iter().take(self.limits.max_items) {
            let significant = text.chars().filter(|c| !c.is_whitespace()).count();
            if significant < self.limits.min_chars {
                continue;
            }
            let prefix = truncate_chars(text, self.limits.max_chars);
            for backend in &self.backends {
                requests.push((*row_index, prefix, Arc::clone(backend)));
            }
        }

        let results: Vec<_> = stream::iter(requests)
            .map(|(row_index, prefix, backend)| async move {
                let outcome = backend.recognize(prefix).await;
                (row_index, backend, outcome)
            })
            .buffered(self.limits.concurrency.max(1))
            .collect()
            .await;

        let mut extraction = Extraction::default();
        for (row_index, backend, outcome) in results {
            match outcome {
                Ok(raw) => {
                    for entity in raw {
                        let word = entity.word.trim();
                        if word.is_empty() {
                            continue;
                        }
                        let category = Category::normalize(&entity.label);
                        extraction.counts.increment(&category);
                        extraction.entities.push(DetectedEntity::new(
                            word,
                            category,
                            entity.score,
                            backend.name(),
                            Some(row_index),
                        ));
                    }
                }
                Err(error) => {
                    crate::log_backend_failure!(backend.name(), row_index, error);
                    extraction.failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        row_index,
                        error,
                    });
                }
            }
        }

        extraction
    }
}

/// Longest prefix of at most `max_chars` characters, on a char boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::answer::gate::ANSWER_THRESHOLD;
use crate::engine::DEFAULT_K;
use crate::error::{QaError, Result};
use crate::search::candidates::DEFAULT_PREFIX_CHARS;
use crate::search::hybrid::DEFAULT_ALPHA;

/// Questions the learned reranker is trained on at startup.
pub const DEFAULT_BOOTSTRAP_QUESTIONS: &[&str] = &[
    "What are PPE safety requirements?",
    "How to safely operate a laser scanner?",
    "Define safety functions for machinery.",
    "Explain risk reduction steps for operators.",
    "What are type-C standards in ISO 13849-1?",
    "How to calculate performance level (PL) for a safety function?",
    "List hazards in industrial machinery.",
    "When should emergency stop be applied?",
];

pub const DEFAULT_ABSTAIN_MESSAGE: &str = "No confident answer found. Abstaining.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("ISQA_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a complete config file without layering or env overrides.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| QaError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    /// Resolve the index directory against the isqa root.
    #[must_use]
    pub fn index_dir(&self, root: &Path) -> PathBuf {
        let dir = PathBuf::from(&self.index.dir);
        if dir.is_absolute() {
            dir
        } else {
            root.join(dir)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.retrieval.alpha) {
            return Err(QaError::Config(format!(
                "retrieval.alpha must be within [0, 1], got {}",
                self.retrieval.alpha
            )));
        }
        if self.retrieval.overfetch == 0 {
            return Err(QaError::Config(
                "retrieval.overfetch must be at least 1".to_string(),
            ));
        }
        if self.retrieval.prefix_chars == 0 {
            return Err(QaError::Config(
                "retrieval.prefix_chars must be at least 1".to_string(),
            ));
        }
        if self.retrieval.default_k == 0 {
            return Err(QaError::Config(
                "retrieval.default_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.dims == 0 {
            return Err(QaError::Config("embedding.dims must be positive".to_string()));
        }
        if self.embedding.backend != "hash" {
            return Err(QaError::Config(format!(
                "unknown embedding backend {} (expected hash)",
                self.embedding.backend
            )));
        }
        if !self.reranker.learning_rate.is_finite() || self.reranker.learning_rate <= 0.0 {
            return Err(QaError::Config(
                "reranker.learning_rate must be positive".to_string(),
            ));
        }
        if !self.reranker.regularization.is_finite() || self.reranker.regularization <= 0.0 {
            return Err(QaError::Config(format!(
                "reranker.regularization must be positive, got {}",
                self.reranker.regularization
            )));
        }
        if !self.reranker.label_threshold.is_finite() {
            return Err(QaError::Config(
                "reranker.label_threshold must be finite".to_string(),
            ));
        }
        if !self.answer.threshold.is_finite() {
            return Err(QaError::Config(format!(
                "answer.threshold must be finite, got {}",
                self.answer.threshold
            )));
        }
        Ok(())
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("isqa/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&root.join("config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| QaError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| QaError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.index {
            self.index.merge(patch);
        }
        if let Some(patch) = patch.embedding {
            self.embedding.merge(patch);
        }
        if let Some(patch) = patch.retrieval {
            self.retrieval.merge(patch);
        }
        if let Some(patch) = patch.reranker {
            self.reranker.merge(patch);
        }
        if let Some(patch) = patch.answer {
            self.answer.merge(patch);
        }
        if let Some(patch) = patch.batch {
            self.batch.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("ISQA_INDEX_DIR") {
            self.index.dir = value;
        }
        if let Some(value) = env_string("ISQA_EMBEDDING_BACKEND") {
            self.embedding.backend = value;
        }
        if let Some(value) = env_parse::<usize>("ISQA_EMBEDDING_DIMS")? {
            self.embedding.dims = value;
        }
        if let Some(value) = env_parse::<usize>("ISQA_DEFAULT_K")? {
            self.retrieval.default_k = value;
        }
        if let Some(value) = env_parse::<f64>("ISQA_HYBRID_ALPHA")? {
            self.retrieval.alpha = value;
        }
        if let Some(value) = env_parse::<f64>("ISQA_ANSWER_THRESHOLD")? {
            self.answer.threshold = value;
        }
        if let Some(value) = env_parse::<f64>("ISQA_LABEL_THRESHOLD")? {
            self.reranker.label_threshold = value;
        }
        if let Some(value) = env_parse::<u64>("ISQA_RERANKER_SEED")? {
            self.reranker.seed = value;
        }
        if let Some(value) = env_parse::<u32>("ISQA_BATCH_MAX_RETRIES")? {
            self.batch.max_retries = value;
        }
        if let Some(value) = env_parse::<u64>("ISQA_BATCH_RETRY_DELAY_MS")? {
            self.batch.retry_delay_ms = value;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding corpus.json, vectors.bin and chunks.db.
    pub dir: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: "index".to_string(),
        }
    }
}

impl IndexConfig {
    fn merge(&mut self, patch: IndexPatch) {
        if let Some(value) = patch.dir {
            self.dir = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: String,
    pub dims: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "hash".to_string(),
            dims: 384,
        }
    }
}

impl EmbeddingConfig {
    fn merge(&mut self, patch: EmbeddingPatch) {
        if let Some(value) = patch.backend {
            self.backend = value;
        }
        if let Some(value) = patch.dims {
            self.dims = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    /// Multiplier applied to k when both retrievers feed a fusion policy.
    pub overfetch: usize,
    /// Leading characters of chunk text that identify a candidate.
    pub prefix_chars: usize,
    /// Vector-channel weight of the hybrid policy.
    pub alpha: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_K,
            overfetch: 3,
            prefix_chars: DEFAULT_PREFIX_CHARS,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl RetrievalConfig {
    fn merge(&mut self, patch: RetrievalPatch) {
        if let Some(value) = patch.default_k {
            self.default_k = value;
        }
        if let Some(value) = patch.overfetch {
            self.overfetch = value;
        }
        if let Some(value) = patch.prefix_chars {
            self.prefix_chars = value;
        }
        if let Some(value) = patch.alpha {
            self.alpha = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    /// A bootstrap candidate is labelled relevant when its vector score is
    /// strictly greater than this value.
    pub label_threshold: f64,
    pub seed: u64,
    pub epochs: u32,
    pub learning_rate: f64,
    /// Inverse L2 regularization strength.
    pub regularization: f64,
    /// Per-retriever result budget while building the training table.
    pub bootstrap_k: usize,
    pub bootstrap_questions: Vec<String>,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            label_threshold: 0.0,
            seed: 42,
            epochs: 200,
            learning_rate: 0.1,
            regularization: 1.0,
            bootstrap_k: 5,
            bootstrap_questions: DEFAULT_BOOTSTRAP_QUESTIONS
                .iter()
                .map(|q| (*q).to_string())
                .collect(),
        }
    }
}

impl RerankerConfig {
    fn merge(&mut self, patch: RerankerPatch) {
        if let Some(value) = patch.label_threshold {
            self.label_threshold = value;
        }
        if let Some(value) = patch.seed {
            self.seed = value;
        }
        if let Some(value) = patch.epochs {
            self.epochs = value;
        }
        if let Some(value) = patch.learning_rate {
            self.learning_rate = value;
        }
        if let Some(value) = patch.regularization {
            self.regularization = value;
        }
        if let Some(value) = patch.bootstrap_k {
            self.bootstrap_k = value;
        }
        if let Some(values) = patch.bootstrap_questions {
            self.bootstrap_questions = values;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerConfig {
    /// Minimum top score required to answer instead of abstaining.
    pub threshold: f64,
    pub max_chunks: usize,
    pub snippet_chars: usize,
    pub abstain_message: String,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            threshold: ANSWER_THRESHOLD,
            max_chunks: 2,
            snippet_chars: 200,
            abstain_message: DEFAULT_ABSTAIN_MESSAGE.to_string(),
        }
    }
}

impl AnswerConfig {
    fn merge(&mut self, patch: AnswerPatch) {
        if let Some(value) = patch.threshold {
            self.threshold = value;
        }
        if let Some(value) = patch.max_chunks {
            self.max_chunks = value;
        }
        if let Some(value) = patch.snippet_chars {
            self.snippet_chars = value;
        }
        if let Some(value) = patch.abstain_message {
            self.abstain_message = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl BatchConfig {
    fn merge(&mut self, patch: BatchPatch) {
        if let Some(value) = patch.max_retries {
            self.max_retries = value;
        }
        if let Some(value) = patch.retry_delay_ms {
            self.retry_delay_ms = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub index: Option<IndexPatch>,
    pub embedding: Option<EmbeddingPatch>,
    pub retrieval: Option<RetrievalPatch>,
    pub reranker: Option<RerankerPatch>,
    pub answer: Option<AnswerPatch>,
    pub batch: Option<BatchPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct IndexPatch {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmbeddingPatch {
    pub backend: Option<String>,
    pub dims: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RetrievalPatch {
    pub default_k: Option<usize>,
    pub overfetch: Option<usize>,
    pub prefix_chars: Option<usize>,
    pub alpha: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RerankerPatch {
    pub label_threshold: Option<f64>,
    pub seed: Option<u64>,
    pub epochs: Option<u32>,
    pub learning_rate: Option<f64>,
    pub regularization: Option<f64>,
    pub bootstrap_k: Option<usize>,
    pub bootstrap_questions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AnswerPatch {
    pub threshold: Option<f64>,
    pub max_chunks: Option<usize>,
    pub snippet_chars: Option<usize>,
    pub abstain_message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BatchPatch {
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err| QaError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

//! Query engine.
//!
//! [`EngineContext`] is built once at startup (corpus, both retrievers, the
//! trained reranker) and is read-only afterwards, so one engine can serve
//! concurrent requests by shared reference. Each request runs
//! retrieve, fuse, gate, then either synthesize or abstain.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::answer::{AnswerSynthesizer, ConfidenceGate, GateDecision};
use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::{QaError, Result};
use crate::indexer::IndexPaths;
use crate::search::embeddings::{Embedder, HashEmbedder};
use crate::search::flat_index::FlatIndex;
use crate::search::fusion::{FusionPolicy, Mode, Retrievers};
use crate::search::keyword::KeywordRetriever;
use crate::search::learned::{self, LogisticModel};
use crate::search::vector::VectorRetriever;
use crate::search::FinalResult;

pub const DEFAULT_K: usize = 5;

const fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub mode: Mode,
}

impl QueryRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            k: DEFAULT_K,
            mode: Mode::default(),
        }
    }

    #[must_use]
    pub const fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: Option<String>,
    pub contexts: Vec<FinalResult>,
    pub reranker_used: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set only by the batch runner when every retry failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    #[must_use]
    pub fn abstained(mode: Mode, message: impl Into<String>) -> Self {
        Self {
            answer: None,
            contexts: Vec::new(),
            reranker_used: mode,
            message: Some(message.into()),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(mode: Mode, error: impl Into<String>) -> Self {
        Self {
            answer: None,
            contexts: Vec::new(),
            reranker_used: mode,
            message: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn top_score(&self) -> Option<f64> {
        self.contexts.first().map(|c| c.score)
    }
}

/// Read-only state shared by every request.
pub struct EngineContext {
    pub corpus: Arc<Corpus>,
    pub retrievers: Retrievers,
    pub model: LogisticModel,
}

pub struct QaEngine {
    context: EngineContext,
    alpha: f64,
    gate: ConfidenceGate,
    synthesizer: AnswerSynthesizer,
    abstain_message: String,
}

impl QaEngine {
    /// Load an index built with the configured hash embedder.
    pub fn open(index_dir: &Path, config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(config.embedding.dims));
        Self::open_with_embedder(index_dir, config, embedder)
    }

    /// Load an index with a caller-supplied embedder. Any missing or
    /// inconsistent artifact fails here, before a request is served.
    pub fn open_with_embedder(
        index_dir: &Path,
        config: &Config,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        let corpus = Arc::new(Corpus::load(&paths.corpus)?);
        let index = FlatIndex::load(&paths.vectors)?;
        let vector = VectorRetriever::new(Arc::clone(&corpus), index, embedder)?;
        let keyword = KeywordRetriever::open(&paths.chunks_db)?;
        if keyword.chunk_count() != corpus.len() {
            return Err(QaError::IndexCorrupt(format!(
                "{} has {} chunks but the corpus has {}",
                paths.chunks_db.display(),
                keyword.chunk_count(),
                corpus.len()
            )));
        }
        debug!(chunks = corpus.len(), dir = %index_dir.display(), "index loaded");
        Self::from_parts(corpus, vector, keyword, config)
    }

    /// Assemble an engine from loaded retrievers and train the reranker.
    pub fn from_parts(
        corpus: Arc<Corpus>,
        vector: VectorRetriever,
        keyword: KeywordRetriever,
        config: &Config,
    ) -> Result<Self> {
        let retrievers = Retrievers {
            vector,
            keyword,
            prefix_chars: config.retrieval.prefix_chars,
            overfetch: config.retrieval.overfetch,
        };
        let model = learned::train(&retrievers, &config.reranker)?;
        info!(
            chunks = corpus.len(),
            weights = ?model.weights,
            bias = model.bias,
            examples = model.examples,
            positives = model.positives,
            "engine ready"
        );

        Ok(Self {
            context: EngineContext {
                corpus,
                retrievers,
                model,
            },
            alpha: config.retrieval.alpha,
            gate: ConfidenceGate::new(config.answer.threshold),
            synthesizer: AnswerSynthesizer {
                max_chunks: config.answer.max_chunks,
                snippet_chars: config.answer.snippet_chars,
            },
            abstain_message: config.answer.abstain_message.clone(),
        })
    }

    #[must_use]
    pub const fn model(&self) -> &LogisticModel {
        &self.context.model
    }

    #[must_use]
    pub fn policy(&self, mode: Mode) -> FusionPolicy<'_> {
        match mode {
            Mode::Baseline => FusionPolicy::Baseline,
            Mode::Hybrid => FusionPolicy::Hybrid { alpha: self.alpha },
            Mode::Learned => FusionPolicy::Learned {
                model: &self.context.model,
            },
        }
    }

    /// Ranked contexts for `query` without gating or synthesis.
    pub fn search(&self, mode: Mode, query: &str, k: usize) -> Result<Vec<FinalResult>> {
        self.policy(mode).fuse(&self.context.retrievers, query, k)
    }

    /// Serve one request. Abstention is a normal response; only invalid
    /// requests and internal failures are errors.
    pub fn answer(&self, request: &QueryRequest) -> Result<QueryResponse> {
        validate(request)?;
        let mode = request.mode;

        let results = self
            .search(mode, &request.q, request.k)
            .map_err(|err| match err {
                err if err.is_client_error() => err,
                err => QaError::Internal(err.to_string()),
            })?;
        let top_score = results.first().map(|r| r.score);

        let response = match self.gate.decide(&results) {
            GateDecision::Abstain => QueryResponse::abstained(mode, self.abstain_message.clone()),
            GateDecision::Answer => QueryResponse {
                answer: Some(self.synthesizer.synthesize(&results)),
                contexts: results,
                reranker_used: mode,
                message: None,
                error: None,
            },
        };

        info!(
            mode = %mode,
            k = request.k,
            top_score = ?top_score,
            abstained = response.answer.is_none(),
            "query served"
        );
        Ok(response)
    }
}

fn validate(request: &QueryRequest) -> Result<()> {
    if request.k == 0 {
        return Err(QaError::InvalidRequest("k must be at least 1".to_string()));
    }
    if request.q.trim().is_empty() {
        return Err(QaError::InvalidRequest("question is empty".to_string()));
    }
    Ok(())
}

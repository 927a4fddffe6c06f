//! Retrieval and fusion engine
//!
//! Two independent signals (dense similarity over hash embeddings, lexical
//! match over SQLite FTS5) are merged into a content-keyed candidate table and
//! ranked by one of three fusion policies.

use serde::{Deserialize, Serialize};

use crate::corpus::ChunkId;

pub mod candidates;
pub mod embeddings;
pub mod flat_index;
pub mod fusion;
pub mod hybrid;
pub mod keyword;
pub mod learned;
pub mod normalize;
pub mod vector;

pub use candidates::{Candidate, CandidateKey, CandidateTable};
pub use embeddings::{Embedder, HashEmbedder};
pub use flat_index::FlatIndex;
pub use fusion::{FusionPolicy, Mode, Retrievers};
pub use keyword::KeywordRetriever;
pub use learned::LogisticModel;
pub use normalize::normalize;
pub use vector::VectorRetriever;

/// One hit from a single retriever. Scores are not comparable across
/// retrievers until they pass through fusion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub chunk: ChunkId,
    pub text: String,
    pub score: f64,
}

/// A ranked context returned to the caller. Score semantics depend on the
/// mode that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub pdf: ChunkId,
    pub text: String,
    pub score: f64,
}

impl From<RetrievalResult> for FinalResult {
    fn from(result: RetrievalResult) -> Self {
        Self {
            pdf: result.chunk,
            text: result.text,
            score: result.score,
        }
    }
}

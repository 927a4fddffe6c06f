//! Fusion policies.
//!
//! A closed set: each [`Mode`] maps to exactly one [`FusionPolicy`] variant,
//! and every policy turns a question into at most `k` ranked results.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QaError, Result};
use crate::search::candidates::CandidateTable;
use crate::search::keyword::KeywordRetriever;
use crate::search::learned::LogisticModel;
use crate::search::vector::VectorRetriever;
use crate::search::{FinalResult, hybrid};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Dense similarity only.
    Baseline,
    /// Weighted sum of normalized dense and lexical scores.
    #[default]
    Hybrid,
    /// Logistic reranker over both raw scores.
    Learned,
}

impl Mode {
    pub const ALL: [Self; 3] = [Self::Baseline, Self::Hybrid, Self::Learned];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Hybrid => "hybrid",
            Self::Learned => "learned",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baseline" => Ok(Self::Baseline),
            "hybrid" => Ok(Self::Hybrid),
            "learned" => Ok(Self::Learned),
            other => Err(QaError::InvalidRequest(format!(
                "unknown mode {other:?} (expected baseline, hybrid or learned)"
            ))),
        }
    }
}

/// Both retrievers plus the settings used to merge their hits.
pub struct Retrievers {
    pub vector: VectorRetriever,
    pub keyword: KeywordRetriever,
    pub prefix_chars: usize,
    /// Per-retriever budget multiplier for the fused modes.
    pub overfetch: usize,
}

impl Retrievers {
    /// Query both retrievers for `per_retriever` hits each and merge them.
    pub fn candidates(&self, query: &str, per_retriever: usize) -> Result<CandidateTable> {
        let vector_hits = self.vector.search(query, per_retriever);
        let keyword_hits = self.keyword.search(query, per_retriever)?;
        let table = CandidateTable::merge(&vector_hits, &keyword_hits, self.prefix_chars);
        debug!(
            vector = vector_hits.len(),
            keyword = keyword_hits.len(),
            candidates = table.len(),
            "candidates merged"
        );
        Ok(table)
    }
}

pub enum FusionPolicy<'a> {
    Baseline,
    Hybrid { alpha: f64 },
    Learned { model: &'a LogisticModel },
}

impl FusionPolicy<'_> {
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Baseline => Mode::Baseline,
            Self::Hybrid { .. } => Mode::Hybrid,
            Self::Learned { .. } => Mode::Learned,
        }
    }

    /// Rank at most `k` results for `query`.
    pub fn fuse(&self, retrievers: &Retrievers, query: &str, k: usize) -> Result<Vec<FinalResult>> {
        let results = self.rank(retrievers, query, k)?;
        debug!(mode = %self.mode(), k, results = results.len(), "fused");
        Ok(results)
    }

    fn rank(&self, retrievers: &Retrievers, query: &str, k: usize) -> Result<Vec<FinalResult>> {
        match self {
            Self::Baseline => Ok(retrievers
                .vector
                .search(query, k)
                .into_iter()
                .map(FinalResult::from)
                .collect()),
            Self::Hybrid { alpha } => {
                let table = retrievers.candidates(query, k.saturating_mul(retrievers.overfetch))?;
                Ok(hybrid::fuse(&table, *alpha, k))
            }
            Self::Learned { model } => {
                let table = retrievers.candidates(query, k.saturating_mul(retrievers.overfetch))?;
                Ok(model.rerank(&table, k))
            }
        }
    }
}

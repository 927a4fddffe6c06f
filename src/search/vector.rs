//! Dense retriever over the flat embedding index.

use std::sync::Arc;

use tracing::debug;

use crate::corpus::Corpus;
use crate::error::{QaError, Result};
use crate::search::RetrievalResult;
use crate::search::embeddings::Embedder;
use crate::search::flat_index::FlatIndex;
use crate::search::normalize::normalize;

pub struct VectorRetriever {
    corpus: Arc<Corpus>,
    index: FlatIndex,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    /// Pair an index with the corpus it was built from. The index must have
    /// one row per chunk and the embedder's dimension.
    pub fn new(corpus: Arc<Corpus>, index: FlatIndex, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if index.dims() != embedder.dims() {
            return Err(QaError::IndexCorrupt(format!(
                "vector index has {} dims but the {} embedder produces {}",
                index.dims(),
                embedder.name(),
                embedder.dims()
            )));
        }
        if index.len() != corpus.len() {
            return Err(QaError::IndexCorrupt(format!(
                "vector index has {} rows but the corpus has {} chunks",
                index.len(),
                corpus.len()
            )));
        }
        Ok(Self {
            corpus,
            index,
            embedder,
        })
    }

    /// Top-`k` chunks by embedding distance, scored by normalized `1 - distance`.
    #[must_use]
    pub fn search(&self, query: &str, k: usize) -> Vec<RetrievalResult> {
        let query_vector = self.embedder.embed(query);
        let hits = self.index.search(&query_vector, k);

        let similarities: Vec<f64> = hits.iter().map(|(_, d)| 1.0 - f64::from(*d)).collect();
        let scores = normalize(&similarities);

        let results: Vec<RetrievalResult> = hits
            .iter()
            .zip(scores)
            .filter_map(|((row, _), score)| {
                self.corpus.get(*row).map(|chunk| RetrievalResult {
                    chunk: chunk.id.clone(),
                    text: chunk.text.clone(),
                    score,
                })
            })
            .collect();

        debug!(k, hits = results.len(), "vector search");
        results
    }
}

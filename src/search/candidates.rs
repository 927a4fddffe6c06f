//! Candidate table: merges the vector and keyword hit lists into one record
//! per content prefix.
//!
//! Identity is the first `prefix_chars` characters of the chunk text, not the
//! chunk id. Two distinct chunks that share that prefix collapse into one
//! candidate.

use std::collections::HashMap;

use crate::corpus::ChunkId;
use crate::search::RetrievalResult;

/// Leading characters of chunk text that identify a candidate.
pub const DEFAULT_PREFIX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey(String);

impl CandidateKey {
    #[must_use]
    pub fn from_text(text: &str, prefix_chars: usize) -> Self {
        Self(text.chars().take(prefix_chars).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub chunk: ChunkId,
    pub text: String,
    pub vector_score: f64,
    pub keyword_score: f64,
}

impl Candidate {
    #[must_use]
    pub const fn features(&self) -> [f64; 2] {
        [self.vector_score, self.keyword_score]
    }
}

/// Insertion-ordered candidates, at most one per [`CandidateKey`].
#[derive(Debug, Clone)]
pub struct CandidateTable {
    prefix_chars: usize,
    entries: Vec<Candidate>,
    positions: HashMap<CandidateKey, usize>,
}

impl CandidateTable {
    #[must_use]
    pub fn new(prefix_chars: usize) -> Self {
        Self {
            prefix_chars,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Vector hits first (they own the base record), then keyword hits.
    #[must_use]
    pub fn merge(
        vector_hits: &[RetrievalResult],
        keyword_hits: &[RetrievalResult],
        prefix_chars: usize,
    ) -> Self {
        let mut table = Self::new(prefix_chars);
        for hit in vector_hits {
            table.insert_vector(hit);
        }
        for hit in keyword_hits {
            table.insert_keyword(hit);
        }
        table
    }

    /// A repeated key replaces the earlier record but keeps its position.
    pub fn insert_vector(&mut self, hit: &RetrievalResult) {
        let candidate = Candidate {
            chunk: hit.chunk.clone(),
            text: hit.text.clone(),
            vector_score: hit.score,
            keyword_score: 0.0,
        };
        let key = CandidateKey::from_text(&hit.text, self.prefix_chars);
        match self.positions.get(&key) {
            Some(&position) => self.entries[position] = candidate,
            None => self.push(key, candidate),
        }
    }

    /// Fill the keyword channel of a known key, or append a keyword-only
    /// candidate.
    pub fn insert_keyword(&mut self, hit: &RetrievalResult) {
        let key = CandidateKey::from_text(&hit.text, self.prefix_chars);
        match self.positions.get(&key) {
            Some(&position) => self.entries[position].keyword_score = hit.score,
            None => self.push(
                key,
                Candidate {
                    chunk: hit.chunk.clone(),
                    text: hit.text.clone(),
                    vector_score: 0.0,
                    keyword_score: hit.score,
                },
            ),
        }
    }

    fn push(&mut self, key: CandidateKey, candidate: Candidate) {
        self.positions.insert(key, self.entries.len());
        self.entries.push(candidate);
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.entries
    }

    #[must_use]
    pub fn vector_scores(&self) -> Vec<f64> {
        self.entries.iter().map(|c| c.vector_score).collect()
    }

    #[must_use]
    pub fn keyword_scores(&self) -> Vec<f64> {
        self.entries.iter().map(|c| c.keyword_score).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

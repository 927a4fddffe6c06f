//! Chunk corpus
//!
//! The corpus is the ordered, immutable list of chunks every retriever points
//! into. Position `i` in the corpus is row `i` of the vector index; the
//! keyword store carries `rank_val = i + 1` for the same chunk.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Stable chunk name, conventionally `<document>_chunk<n>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(String);

impl ChunkId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Source document this chunk was cut from (`doc_chunk3.pdf` -> `doc.pdf`).
    #[must_use]
    pub fn document_name(&self) -> String {
        let (stem, ext) = match self.0.rsplit_once('.') {
            Some((stem, ext)) if !ext.contains('_') => (stem, Some(ext)),
            _ => (self.0.as_str(), None),
        };
        let base = match stem.rsplit_once("_chunk") {
            Some((base, n)) if !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => base,
            _ => stem,
        };
        match ext {
            Some(ext) => format!("{base}.{ext}"),
            None => base.to_string(),
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chunk record as produced by the ingestion step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub pdf: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_pdf: Option<String>,
}

/// Immutable unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "pdf")]
    pub id: ChunkId,
    #[serde(rename = "source_pdf")]
    pub document: String,
    pub text: String,
    /// Ordinal assigned at index build; the keyword path orders by it.
    #[serde(rename = "rank_val")]
    pub rank: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

impl Corpus {
    /// Build a corpus from ingestion records, assigning `rank = position + 1`.
    #[must_use]
    pub fn from_records(records: Vec<ChunkRecord>) -> Self {
        let chunks = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                let id = ChunkId::new(record.pdf);
                let document = record.source_pdf.unwrap_or_else(|| id.document_name());
                Chunk {
                    id,
                    document,
                    text: record.text,
                    rank: i64::try_from(position).map_or(i64::MAX, |p| p + 1),
                }
            })
            .collect();
        Self { chunks }
    }

    #[must_use]
    pub const fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    /// Load ingestion records (a JSON array of `{pdf, text}` objects).
    pub fn read_records(path: &Path) -> Result<Vec<ChunkRecord>> {
        if !path.exists() {
            return Err(QaError::IndexMissing(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load a corpus written by [`Corpus::save`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QaError::IndexMissing(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let chunks: Vec<Chunk> = serde_json::from_str(&raw).map_err(|err| {
            QaError::IndexCorrupt(format!("corpus {}: {err}", path.display()))
        })?;
        Ok(Self { chunks })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.chunks)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

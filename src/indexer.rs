//! Index build: chunk records in, the three persisted artifacts out.
//!
//! An index directory holds `corpus.json` (ordered chunks), `vectors.bin`
//! (one embedding row per chunk, same order) and `chunks.db` (FTS5 table).

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::corpus::{ChunkRecord, Corpus};
use crate::error::Result;
use crate::search::embeddings::Embedder;
use crate::search::flat_index::FlatIndex;
use crate::storage::ChunkStore;

pub const CORPUS_FILE: &str = "corpus.json";
pub const VECTORS_FILE: &str = "vectors.bin";
pub const CHUNKS_DB_FILE: &str = "chunks.db";

/// Paths of the artifacts inside one index directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub corpus: PathBuf,
    pub vectors: PathBuf,
    pub chunks_db: PathBuf,
}

impl IndexPaths {
    #[must_use]
    pub fn new(index_dir: &Path) -> Self {
        Self {
            corpus: index_dir.join(CORPUS_FILE),
            vectors: index_dir.join(VECTORS_FILE),
            chunks_db: index_dir.join(CHUNKS_DB_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub chunks: usize,
    pub documents: usize,
    pub dims: usize,
    pub embedder: String,
    pub index_dir: PathBuf,
}

/// Embed every chunk and write all three artifacts, replacing any previous
/// build. `progress` is advanced once per embedded chunk.
pub fn build_index(
    records: Vec<ChunkRecord>,
    index_dir: &Path,
    embedder: &dyn Embedder,
    progress: Option<&ProgressBar>,
) -> Result<IndexSummary> {
    std::fs::create_dir_all(index_dir)?;
    let paths = IndexPaths::new(index_dir);
    let corpus = Corpus::from_records(records);

    let vectors: Vec<Vec<f32>> = corpus
        .chunks()
        .par_iter()
        .map(|chunk| {
            let vector = embedder.embed(&chunk.text);
            if let Some(pb) = progress {
                pb.inc(1);
            }
            vector
        })
        .collect();

    let mut index = FlatIndex::new(embedder.dims());
    for vector in &vectors {
        index.add(vector)?;
    }

    corpus.save(&paths.corpus)?;
    index.save(&paths.vectors)?;
    ChunkStore::create(&paths.chunks_db, &corpus)?;

    let mut documents: Vec<&str> = corpus.chunks().iter().map(|c| c.document.as_str()).collect();
    documents.sort_unstable();
    documents.dedup();

    let summary = IndexSummary {
        chunks: corpus.len(),
        documents: documents.len(),
        dims: embedder.dims(),
        embedder: embedder.name().to_string(),
        index_dir: index_dir.to_path_buf(),
    };
    info!(
        chunks = summary.chunks,
        documents = summary.documents,
        dims = summary.dims,
        dir = %index_dir.display(),
        "index built"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::embeddings::HashEmbedder;

    fn record(pdf: &str, text: &str) -> ChunkRecord {
        ChunkRecord {
            pdf: pdf.to_string(),
            text: text.to_string(),
            source_pdf: None,
        }
    }

    #[test]
    fn writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::new(32);
        let summary = build_index(
            vec![
                record("a_chunk1.pdf", "wear gloves near blades"),
                record("a_chunk2.pdf", "goggles protect eyes"),
                record("b_chunk1.pdf", "emergency stop button"),
            ],
            dir.path(),
            &embedder,
            None,
        )
        .unwrap();

        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.dims, 32);

        let paths = IndexPaths::new(dir.path());
        assert_eq!(Corpus::load(&paths.corpus).unwrap().len(), 3);
        let index = FlatIndex::load(&paths.vectors).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dims(), 32);
        let store = ChunkStore::open_read_only(&paths.chunks_db).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 3);
    }

    #[test]
    fn rows_follow_corpus_order() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::new(64);
        let texts = ["alpha beta", "gamma delta", "epsilon zeta", "eta theta"];
        build_index(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| record(&format!("d_chunk{i}.pdf"), t))
                .collect(),
            dir.path(),
            &embedder,
            None,
        )
        .unwrap();

        let index = FlatIndex::load(&IndexPaths::new(dir.path()).vectors).unwrap();
        for (row, text) in texts.iter().enumerate() {
            let hits = index.search(&embedder.embed(text), 1);
            assert_eq!(hits[0].0, row);
        }
    }

    #[test]
    fn rebuild_replaces_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = HashEmbedder::new(16);
        build_index(vec![record("a", "one"), record("b", "two")], dir.path(), &embedder, None)
            .unwrap();
        build_index(vec![record("c", "three")], dir.path(), &embedder, None).unwrap();

        let store = ChunkStore::open_read_only(IndexPaths::new(dir.path()).chunks_db).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 1);
    }

    #[test]
    fn empty_corpus_builds() {
        let dir = tempfile::tempdir().unwrap();
        let summary = build_index(Vec::new(), dir.path(), &HashEmbedder::new(8), None).unwrap();
        assert_eq!(summary.chunks, 0);
        assert!(FlatIndex::load(&IndexPaths::new(dir.path()).vectors).unwrap().is_empty());
    }
}

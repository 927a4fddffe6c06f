use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::config::Config;
use crate::corpus::ChunkRecord;
use crate::engine::QaEngine;
use crate::indexer::build_index;
use crate::search::embeddings::{Embedder, HashEmbedder};

/// Small industrial-safety corpus used across engine tests.
pub const SAFETY_CHUNKS: &[(&str, &str)] = &[
    (
        "ppe_guide_chunk1.pdf",
        "Personal protective equipment such as gloves, goggles and hearing protection must be worn in the machine hall.",
    ),
    (
        "ppe_guide_chunk2.pdf",
        "Protective gloves shall be inspected before each shift and replaced when cut or worn.",
    ),
    (
        "machinery_chunk1.pdf",
        "The emergency stop must override all other functions and bring the machine to a safe state.",
    ),
    (
        "machinery_chunk2.pdf",
        "Risk reduction follows three steps: inherently safe design, safeguarding, and information for use.",
    ),
    (
        "iso13849_chunk1.pdf",
        "The performance level PL of a safety function is determined from category, MTTFd, diagnostic coverage and CCF.",
    ),
    (
        "laser_chunk1.pdf",
        "Operators of a laser scanner must verify the protective field configuration before operation.",
    ),
];

#[must_use]
pub fn records(chunks: &[(&str, &str)]) -> Vec<ChunkRecord> {
    chunks
        .iter()
        .map(|(pdf, text)| ChunkRecord {
            pdf: (*pdf).to_string(),
            text: (*text).to_string(),
            source_pdf: None,
        })
        .collect()
}

/// A real on-disk index (corpus, vectors, FTS5 store) in an isolated temp
/// directory. The directory doubles as an isqa root: the index lives in its
/// default `index/` subdirectory.
pub struct IndexFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub embedder: Arc<dyn Embedder>,
}

impl IndexFixture {
    /// Index `chunks` with the default hash embedder.
    #[must_use]
    pub fn build(chunks: &[(&str, &str)]) -> Self {
        let dims = Config::default().embedding.dims;
        Self::build_with(chunks, Arc::new(HashEmbedder::new(dims)))
    }

    #[must_use]
    pub fn build_with(chunks: &[(&str, &str)], embedder: Arc<dyn Embedder>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let index_dir = root.join("index");

        build_index(records(chunks), &index_dir, embedder.as_ref(), None)
            .expect("Failed to build index");
        println!(
            "[FIXTURE] Built index with {} chunks at {index_dir:?}",
            chunks.len()
        );

        Self {
            temp_dir,
            root,
            index_dir,
            embedder,
        }
    }

    #[must_use]
    pub fn safety() -> Self {
        Self::build(SAFETY_CHUNKS)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::build(&[])
    }

    /// Open an engine over the fixture with default settings.
    #[must_use]
    pub fn engine(&self) -> QaEngine {
        self.engine_with(&Config::default())
    }

    #[must_use]
    pub fn engine_with(&self, config: &Config) -> QaEngine {
        QaEngine::open_with_embedder(&self.index_dir, config, Arc::clone(&self.embedder))
            .expect("Failed to open engine")
    }
}

impl Drop for IndexFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.root);
    }
}

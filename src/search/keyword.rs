//! Lexical retriever over the FTS5 chunk table.
//!
//! Queries are sanitized into a plain conjunction of barewords before they
//! reach `MATCH`. Anything the full-text engine still rejects is a soft miss:
//! the retriever returns no hits instead of failing the request.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::params;
use tracing::debug;

use crate::corpus::ChunkId;
use crate::error::{QaError, Result};
use crate::search::RetrievalResult;
use crate::storage::ChunkStore;

/// Every character FTS5 cannot accept inside a bareword.
static RESERVED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static pattern compiles"));

/// Boolean and proximity operators of the FTS5 query language.
const OPERATOR_WORDS: &[&str] = &["AND", "OR", "NOT", "NEAR"];

/// Strip reserved characters and operator words, collapsing whitespace.
#[must_use]
pub fn sanitize_query(query: &str) -> String {
    let stripped = RESERVED_CHARS.replace_all(query, " ");
    stripped
        .split_whitespace()
        .filter(|word| !OPERATOR_WORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyword score: reciprocal of the stored ordinal, 0 for ordinal 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rank_score(rank: i64) -> f64 {
    if rank == 0 { 0.0 } else { 1.0 / rank as f64 }
}

pub struct KeywordRetriever {
    db_path: PathBuf,
    chunks: usize,
}

impl KeywordRetriever {
    /// Verify the store is readable. Each search opens its own read-only
    /// connection, so the retriever is shareable across threads.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let chunks = ChunkStore::open_read_only(&db_path)?.chunk_count()?;
        let chunks = usize::try_from(chunks).map_err(|_| {
            QaError::IndexCorrupt(format!("{}: negative chunk count", db_path.display()))
        })?;
        Ok(Self { db_path, chunks })
    }

    /// Number of chunks in the store when it was opened.
    #[must_use]
    pub const fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Up to `k` matching chunks in stored rank order.
    ///
    /// Failing to open the store is an error; a query the full-text engine
    /// rejects is not.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let expression = sanitize_query(query);
        if expression.is_empty() || k == 0 {
            debug!(query, "keyword query empty after sanitizing");
            return Ok(Vec::new());
        }

        let store = ChunkStore::open_read_only(&self.db_path)?;
        match run_match(&store, &expression, k) {
            Ok(results) => {
                debug!(k, hits = results.len(), "keyword search");
                Ok(results)
            }
            Err(err) => {
                debug!(expression, error = %err, "keyword search soft miss");
                Ok(Vec::new())
            }
        }
    }
}

fn run_match(
    store: &ChunkStore,
    expression: &str,
    k: usize,
) -> rusqlite::Result<Vec<RetrievalResult>> {
    let mut stmt = store.conn().prepare(
        "SELECT pdf, text, rank_val FROM chunks
         WHERE chunks MATCH ?1
         ORDER BY rank_val
         LIMIT ?2",
    )?;
    let limit = i64::try_from(k).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![expression, limit], |row| {
        let pdf: String = row.get(0)?;
        let text: String = row.get(1)?;
        let rank: i64 = row.get(2)?;
        Ok(RetrievalResult {
            chunk: ChunkId::new(pdf),
            text,
            score: rank_score(rank),
        })
    })?;
    rows.collect()
}

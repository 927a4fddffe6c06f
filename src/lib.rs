//! isqa - multi-strategy retrieval, score fusion and abstention over a
//! chunked industrial-safety corpus.
//!
//! Two retrievers (hash-embedding nearest neighbours and SQLite FTS5) feed a
//! content-keyed candidate table; one of three fusion modes ranks it; a
//! confidence gate decides between an extractive cited answer and an
//! explicit abstention.

pub mod answer;
pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod search;
pub mod storage;
pub mod test_utils;

pub use error::{QaError, Result};

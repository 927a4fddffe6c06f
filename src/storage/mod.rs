//! Storage layer for isqa
//!
//! The keyword path reads a SQLite FTS5 table; the vector path reads the flat
//! index file in [`crate::search::flat_index`].

pub mod sqlite;

pub use sqlite::ChunkStore;

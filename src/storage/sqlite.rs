//! SQLite FTS5 chunk store

use std::path::Path;

use rusqlite::{Connection, OpenFlags, params};

use crate::corpus::Corpus;
use crate::error::{QaError, Result};

/// Name of the FTS5 virtual table holding `(pdf, text, rank_val)`.
pub const CHUNKS_TABLE: &str = "chunks";

/// SQLite database wrapper for the full-text chunk table
pub struct ChunkStore {
    conn: Connection,
}

impl ChunkStore {
    /// Build a fresh store next to `path` and move it into place, so a failed
    /// build leaves any previous store untouched.
    pub fn create(path: impl AsRef<Path>, corpus: &Corpus) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("db.tmp");
        if temp_path.exists() {
            std::fs::remove_file(&temp_path)?;
        }

        if let Err(err) = Self::populate(&temp_path, corpus) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err);
        }
        std::fs::rename(&temp_path, path)?;

        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    fn populate(path: &Path, corpus: &Corpus) -> Result<()> {
        let mut conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        conn.execute_batch(
            "CREATE VIRTUAL TABLE chunks USING fts5(pdf UNINDEXED, text, rank_val UNINDEXED);",
        )?;

        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO chunks (pdf, text, rank_val) VALUES (?1, ?2, ?3)")?;
            for chunk in corpus.chunks() {
                stmt.execute(params![chunk.id.as_str(), chunk.text, chunk.rank])?;
            }
        }
        tx.commit()?;
        conn.close().map_err(|(_, err)| err)?;
        Ok(())
    }

    /// Open an existing store read-only. Fails if the file or the chunk table
    /// is missing.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(QaError::IndexMissing(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let store = Self { conn };
        if !store.has_chunks_table()? {
            return Err(QaError::IndexCorrupt(format!(
                "{}: missing {CHUNKS_TABLE} table",
                path.display()
            )));
        }
        Ok(store)
    }

    /// Get a reference to the connection
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn chunk_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?)
    }

    fn has_chunks_table(&self) -> Result<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [CHUNKS_TABLE],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        // Rollback journal, not WAL: the served file is opened read-only.
        conn.execute_batch(
            "PRAGMA journal_mode = DELETE;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ChunkRecord;
    use tempfile::tempdir;

    fn corpus() -> Corpus {
        Corpus::from_records(vec![
            ChunkRecord {
                pdf: "a_chunk1.pdf".to_string(),
                text: "wear hearing protection".to_string(),
                source_pdf: None,
            },
            ChunkRecord {
                pdf: "a_chunk2.pdf".to_string(),
                text: "guard rotating parts".to_string(),
                source_pdf: None,
            },
        ])
    }

    #[test]
    fn create_then_reopen_read_only() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chunks.db");
        let store = ChunkStore::create(&db_path, &corpus()).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 2);
        drop(store);

        let reopened = ChunkStore::open_read_only(&db_path).unwrap();
        assert_eq!(reopened.chunk_count().unwrap(), 2);
    }

    #[test]
    fn create_replaces_previous_build() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chunks.db");
        ChunkStore::create(&db_path, &corpus()).unwrap();
        let store = ChunkStore::create(&db_path, &Corpus::default()).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 0);
    }

    #[test]
    fn failed_rebuild_keeps_previous_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chunks.db");
        ChunkStore::create(&db_path, &corpus()).unwrap();

        // A directory squatting on the build path makes the rebuild fail.
        std::fs::create_dir(dir.path().join("chunks.db.tmp")).unwrap();
        assert!(ChunkStore::create(&db_path, &Corpus::default()).is_err());

        let store = ChunkStore::open_read_only(&db_path).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 2);
    }

    #[test]
    fn rebuild_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chunks.db");
        ChunkStore::create(&db_path, &corpus()).unwrap();
        ChunkStore::create(&db_path, &corpus()).unwrap();
        assert!(!dir.path().join("chunks.db.tmp").exists());
    }

    #[test]
    fn missing_file_is_index_missing() {
        let dir = tempdir().unwrap();
        let err = ChunkStore::open_read_only(dir.path().join("chunks.db")).err().unwrap();
        assert!(matches!(err, QaError::IndexMissing(_)));
    }

    #[test]
    fn database_without_table_is_corrupt() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("chunks.db");
        Connection::open(&db_path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x INTEGER);")
            .unwrap();
        let err = ChunkStore::open_read_only(&db_path).err().unwrap();
        assert!(matches!(err, QaError::IndexCorrupt(_)));
    }
}

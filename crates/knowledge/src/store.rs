//! Vector store: persistent (id, text, vector, metadata) with k-NN search.
//!
//! The SQLite backend runs in WAL mode. Writes go through a single writer
//! connection behind a mutex; every search opens its own read-only
//! connection, so queries are not blocked by an ingestion in progress.

use crate::types::{RetrievalResult, StoreStats, VectorStoreEntry};
use ragdoc_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Trait for vector store backends.
pub trait VectorStore: Send + Sync {
    /// Insert new ids and replace existing ones, atomically.
    ///
    /// Returns the number of distinct entries written.
    fn upsert(&self, entries: &[VectorStoreEntry]) -> AppResult<usize>;

    /// All stored ids.
    fn existing_ids(&self) -> AppResult<HashSet<String>>;

    /// Content hash of every stored id.
    fn fingerprints(&self) -> AppResult<HashMap<String, String>>;

    /// Ids stored for one source document.
    fn ids_for_source(&self, source_id: &str) -> AppResult<Vec<String>>;

    /// Remove entries by id. Returns how many existed.
    fn delete(&self, ids: &[String]) -> AppResult<usize>;

    /// Up to `k` entries by descending cosine similarity.
    ///
    /// Ties keep insertion order. `k == 0` is an input error.
    fn similarity_search(&self, query: &[f32], k: usize) -> AppResult<Vec<RetrievalResult>>;

    /// Entry, source and dimension counts.
    fn stats(&self) -> AppResult<StoreStats>;

    /// Remove everything, including the fixed dimension.
    fn reset(&self) -> AppResult<()>;
}

/// Run a store call on tokio's blocking pool.
///
/// SQLite calls block on disk and on the writer mutex, so async callers go
/// through here instead of calling the store on a runtime thread.
pub async fn blocking<T, F>(store: &Arc<dyn VectorStore>, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn VectorStore) -> AppResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| AppError::Store(format!("Store task failed: {}", e)))?
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    page INTEGER NOT NULL,
    chunk_index INTEGER NOT NULL,
    text TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed vector store.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    writer: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Store(format!("Failed to create store directory {:?}: {}", parent, e))
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Store(format!("Failed to open store {:?}: {}", path, e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!("Opened vector store at {:?} (journal_mode={})", path, mode);

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(&self) -> AppResult<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut Connection) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self
            .writer
            .lock()
            .map_err(|_| AppError::Store("Store writer lock poisoned".to_string()))?;
        f(&mut *conn)
    }
}

fn stored_dimensions(conn: &Connection) -> AppResult<Option<usize>> {
    let value: Option<String> = conn
        .query_row("SELECT value FROM meta WHERE key = 'dimensions'", [], |row| {
            row.get(0)
        })
        .optional()?;

    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| AppError::Store(format!("Corrupt dimension record '{}': {}", v, e)))
        })
        .transpose()
}

/// Drop exact duplicates and reject same-id entries with different text.
fn dedupe(entries: &[VectorStoreEntry]) -> AppResult<Vec<&VectorStoreEntry>> {
    let mut seen: HashMap<&str, &VectorStoreEntry> = HashMap::new();
    let mut unique = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.id.is_empty() {
            return Err(AppError::Store("Entry id cannot be empty".to_string()));
        }
        if entry.vector.is_empty() {
            return Err(AppError::Store(format!("Entry {} has an empty vector", entry.id)));
        }
        if entry.vector.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Store(format!(
                "Entry {} has a non-finite vector component",
                entry.id
            )));
        }

        match seen.get(entry.id.as_str()) {
            Some(prev) if prev.text != entry.text => {
                return Err(AppError::Store(format!(
                    "Conflicting entries for id {} in one upsert",
                    entry.id
                )));
            }
            Some(_) => continue,
            None => {
                seen.insert(entry.id.as_str(), entry);
                unique.push(entry);
            }
        }
    }

    Ok(unique)
}

impl VectorStore for SqliteStore {
    fn upsert(&self, entries: &[VectorStoreEntry]) -> AppResult<usize> {
        let unique = dedupe(entries)?;
        let Some(first) = unique.first() else {
            return Ok(0);
        };
        let dims = first.vector.len();
        if let Some(bad) = unique.iter().find(|e| e.vector.len() != dims) {
            return Err(AppError::Store(format!(
                "Entry {} has {} dimensions, batch has {}",
                bad.id,
                bad.vector.len(),
                dims
            )));
        }

        self.with_writer(|conn| {
            let tx = conn.transaction()?;

            match stored_dimensions(&tx)? {
                Some(expected) if expected != dims => {
                    return Err(AppError::Store(format!(
                        "Vectors have {} dimensions, store holds {}",
                        dims, expected
                    )));
                }
                Some(_) => {}
                None => {
                    tx.execute(
                        "INSERT INTO meta (key, value) VALUES ('dimensions', ?1)",
                        params![dims.to_string()],
                    )?;
                }
            }

            {
                // ON CONFLICT keeps the rowid, so replaced entries keep their insertion order
                let mut stmt = tx.prepare(
                    "INSERT INTO chunks (id, source_id, page, chunk_index, text, content_hash, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                        source_id = excluded.source_id,
                        page = excluded.page,
                        chunk_index = excluded.chunk_index,
                        text = excluded.text,
                        content_hash = excluded.content_hash,
                        embedding = excluded.embedding",
                )?;
                for entry in &unique {
                    stmt.execute(params![
                        entry.id,
                        entry.source_id,
                        entry.page as i64,
                        entry.chunk_index as i64,
                        entry.text,
                        entry.content_hash,
                        embedding_to_bytes(&entry.vector),
                    ])?;
                }
            }

            tx.commit()?;
            Ok(unique.len())
        })
    }

    fn existing_ids(&self) -> AppResult<HashSet<String>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare("SELECT id FROM chunks")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn fingerprints(&self) -> AppResult<HashMap<String, String>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare("SELECT id, content_hash FROM chunks")?;
        let map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(map)
    }

    fn ids_for_source(&self, source_id: &str) -> AppResult<Vec<String>> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare("SELECT id FROM chunks WHERE source_id = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map(params![source_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn delete(&self, ids: &[String]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.with_writer(|conn| {
            let tx = conn.transaction()?;
            let mut removed = 0;
            {
                let mut stmt = tx.prepare("DELETE FROM chunks WHERE id = ?1")?;
                for id in ids {
                    removed += stmt.execute(params![id])?;
                }
            }
            tx.commit()?;
            Ok(removed)
        })
    }

    fn similarity_search(&self, query: &[f32], k: usize) -> AppResult<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(AppError::Input("k must be at least 1".to_string()));
        }
        if query.is_empty() || query.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Input(
                "Query vector must be non-empty and finite".to_string(),
            ));
        }

        let conn = self.reader()?;
        if let Some(dims) = stored_dimensions(&conn)? {
            if dims != query.len() {
                return Err(AppError::Store(format!(
                    "Query vector has {} dimensions, store holds {}",
                    query.len(),
                    dims
                )));
            }
        }

        let mut stmt = conn.prepare(
            "SELECT id, source_id, page, chunk_index, text, content_hash, embedding
             FROM chunks ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    VectorStoreEntry {
                        id: row.get(0)?,
                        source_id: row.get(1)?,
                        page: row.get::<_, i64>(2)? as u32,
                        chunk_index: row.get::<_, i64>(3)? as u32,
                        text: row.get(4)?,
                        content_hash: row.get(5)?,
                        vector: Vec::new(),
                    },
                    row.get::<_, Vec<u8>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = Vec::with_capacity(rows.len());
        for (mut entry, bytes) in rows {
            entry.vector = bytes_to_embedding(&bytes)?;
            let score = cosine_similarity(query, &entry.vector);
            results.push(RetrievalResult { entry, score });
        }

        // Stable sort: equal scores stay in rowid order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), k);

        Ok(results)
    }

    fn stats(&self) -> AppResult<StoreStats> {
        let conn = self.reader()?;
        let entries: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        let sources: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT source_id) FROM chunks",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            entries: entries as usize,
            sources: sources as usize,
            dimensions: stored_dimensions(&conn)?,
        })
    }

    fn reset(&self) -> AppResult<()> {
        self.with_writer(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM chunks", [])?;
            tx.execute("DELETE FROM meta", [])?;
            tx.commit()?;
            Ok(())
        })?;

        tracing::info!("Reset vector store at {:?}", self.path);
        Ok(())
    }
}

/// Little-endian f32 encoding.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Store(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Cosine similarity; 0.0 when either vector has zero length.
///
/// Accumulates in f64 so large finite components cannot overflow the norms.
/// A score that is still not finite ranks last.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = (dot_product / (norm_a * norm_b)) as f32;
    if score.is_finite() {
        // -0.0 and 0.0 must tie under total_cmp
        score + 0.0
    } else {
        f32::MIN
    }
}

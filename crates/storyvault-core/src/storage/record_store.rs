//! Record store
//!
//! `RecordStore` is the backend-agnostic contract the rest of the crate
//! talks to; `SqliteRecordStore` is the embedded implementation.
//!
//! Each operation is atomic on its own. There are no transactions spanning
//! several operations, so a `clear()` followed by many `put()`s can be
//! interrupted halfway.
//!
//! The SQLite connection is opened lazily on the first operation and cached
//! for the lifetime of the store handle. Queries run on tokio's blocking
//! pool behind a mutex.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::Config;
use crate::models::StoryRecord;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};

/// Durable table of story records keyed by id
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace a record by id
    async fn put(&self, record: &StoryRecord) -> StorageResult<()>;

    /// Point lookup; `None` when no record has this id
    async fn get(&self, id: &str) -> StorageResult<Option<StoryRecord>>;

    /// Every stored record, in no particular order
    async fn get_all(&self) -> StorageResult<Vec<StoryRecord>>;

    /// Remove a record. Unknown ids are not an error.
    async fn delete(&self, id: &str) -> StorageResult<()>;

    /// Remove every record in one transaction
    async fn clear(&self) -> StorageResult<()>;

    /// Number of stored records
    async fn count(&self) -> StorageResult<usize>;
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-backed record store
pub struct SqliteRecordStore {
    location: Location,
    conn: OnceCell<Arc<Mutex<Connection>>>,
}

impl SqliteRecordStore {
    /// Create a store backed by the database file at `path`
    ///
    /// Nothing touches the filesystem until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: OnceCell::new(),
        }
    }

    /// Create a store at the configured database path
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database_path())
    }

    /// Create a store backed by a private in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: OnceCell::new(),
        }
    }

    /// Database file path, if file-backed
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    /// Whether the connection has been opened yet
    pub fn is_open(&self) -> bool {
        self.conn.initialized()
    }

    /// Get the cached connection, opening it on first use
    async fn connection(&self) -> StorageResult<Arc<Mutex<Connection>>> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let location = self.location.clone();
                tokio::task::spawn_blocking(move || open_connection(&location))
                    .await
                    .map_err(|e| StorageError::Task(e.to_string()))?
            })
            .await?;
        Ok(Arc::clone(conn))
    }

    /// Run a closure against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn put(&self, record: &StoryRecord) -> StorageResult<()> {
        let id = record.id.clone();
        let document = serde_json::to_string(record).map_err(|source| StorageError::Serialize {
            id: id.clone(),
            source,
        })?;

        debug!("Saving story {}", id);
        self.run(move |conn| {
            conn.execute(
                r#"
                INSERT INTO stories (id, document) VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET document = excluded.document
                "#,
                params![id, document],
            )
            .map_err(|e| StorageError::write("save story", e))?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> StorageResult<Option<StoryRecord>> {
        let id = id.to_string();
        self.run(move |conn| {
            let document: Option<String> = conn
                .query_row(
                    "SELECT document FROM stories WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| StorageError::read("load story", e))?;

            document.map(|doc| parse_document(&id, &doc)).transpose()
        })
        .await
    }

    async fn get_all(&self) -> StorageResult<Vec<StoryRecord>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, document FROM stories ORDER BY rowid")
                .map_err(|e| StorageError::read("load stories", e))?;

            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(|e| StorageError::read("load stories", e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::read("load stories", e))?;

            rows.iter()
                .map(|(id, doc)| parse_document(id, doc))
                .collect()
        })
        .await
    }

    async fn delete(&self, id: &str) -> StorageResult<()> {
        let id = id.to_string();
        debug!("Deleting story {}", id);
        self.run(move |conn| {
            conn.execute("DELETE FROM stories WHERE id = ?1", params![id])
                .map_err(|e| StorageError::write("delete story", e))?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> StorageResult<()> {
        debug!("Clearing all stories");
        self.run(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| StorageError::write("clear library", e))?;
            tx.execute("DELETE FROM stories", [])
                .map_err(|e| StorageError::write("clear library", e))?;
            tx.commit()
                .map_err(|e| StorageError::write("clear library", e))?;
            Ok(())
        })
        .await
    }

    async fn count(&self) -> StorageResult<usize> {
        self.run(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM stories", [], |row| row.get(0))
                .map_err(|e| StorageError::read("count stories", e))?;
            Ok(count.max(0) as usize)
        })
        .await
    }
}

/// Open the database and create the schema if absent
fn open_connection(location: &Location) -> StorageResult<Arc<Mutex<Connection>>> {
    let conn = match location {
        Location::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    StorageError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
            debug!("Opening library database at {:?}", path);
            Connection::open(path).map_err(|source| StorageError::Open {
                path: path.clone(),
                source,
            })?
        }
        Location::Memory => Connection::open_in_memory().map_err(|source| StorageError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?,
    };

    if needs_init(&conn) {
        init_schema(&conn).map_err(|e| StorageError::write("initialize schema", e))?;
    }

    Ok(Arc::new(Mutex::new(conn)))
}

fn parse_document(id: &str, document: &str) -> StorageResult<StoryRecord> {
    serde_json::from_str(document).map_err(|source| StorageError::CorruptRecord {
        id: id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn story(id: &str, title: &str) -> StoryRecord {
        StoryRecord::new(id, title, format!("{} content", title))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SqliteRecordStore::in_memory();

        let record = story("story-1", "First").with_tags(["a", "b"]);
        store.put(&record).await.unwrap();

        let loaded = store.get("story-1").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = SqliteRecordStore::in_memory();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let store = SqliteRecordStore::in_memory();

        let record = story("a", "Title");
        store.put(&record).await.unwrap();
        store.put(&record).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a");

        // Overwrite with new field values under the same id
        let edited = StoryRecord::new("a", "Renamed", "new body");
        store.put(&edited).await.unwrap();
        let all = store.get_all().await.unwrap();
        assert_eq!(all, vec![edited]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = SqliteRecordStore::in_memory();
        store.put(&story("a", "A")).await.unwrap();

        let before = store.get_all().await.unwrap();
        store.delete("does-not-exist").await.unwrap();
        assert_eq!(store.get_all().await.unwrap(), before);

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        store.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteRecordStore::in_memory();
        for i in 0..5 {
            store.put(&story(&format!("story-{}", i), "T")).await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 5);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_insertion_order() {
        let store = SqliteRecordStore::in_memory();
        store.put(&story("z", "Z")).await.unwrap();
        store.put(&story("a", "A")).await.unwrap();
        store.put(&story("m", "M")).await.unwrap();

        // Updating keeps the original position
        store.put(&story("z", "Z2")).await.unwrap();

        let ids: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_opaque_ids_preserved() {
        let store = SqliteRecordStore::in_memory();
        let odd = story("imported/ünïcode id 42", "Odd");
        store.put(&odd).await.unwrap();
        assert_eq!(store.get(&odd.id).await.unwrap(), Some(odd));
    }

    #[tokio::test]
    async fn test_missing_tags_normalized_on_read() {
        let store = SqliteRecordStore::in_memory();
        store
            .run(|conn| {
                conn.execute(
                    "INSERT INTO stories (id, document) VALUES ('old', ?1)",
                    [r#"{"id":"old","title":"Legacy","author":"X","content":"C"}"#],
                )
                .map_err(|e| StorageError::write("seed", e))?;
                Ok(())
            })
            .await
            .unwrap();

        let record = store.get("old").await.unwrap().unwrap();
        assert!(record.tags.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_read_error() {
        let store = SqliteRecordStore::in_memory();
        store
            .run(|conn| {
                conn.execute(
                    "INSERT INTO stories (id, document) VALUES ('bad', 'not json')",
                    [],
                )
                .map_err(|e| StorageError::write("seed", e))?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.get("bad").await.unwrap_err();
        assert!(matches!(err, StorageError::CorruptRecord { .. }));
        assert!(err.is_read());
    }

    #[tokio::test]
    async fn test_opens_lazily() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("library.db");

        let store = SqliteRecordStore::new(&path);
        assert!(!store.is_open());
        assert!(!path.exists());

        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.is_open());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.db");

        {
            let store = SqliteRecordStore::new(&path);
            store.put(&story("story-1", "Persistent")).await.unwrap();
        }

        let store = SqliteRecordStore::new(&path);
        let loaded = store.get("story-1").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Persistent");
    }
}

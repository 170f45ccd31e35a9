use crate::{DocumentStore, IndexRecord, Result, StoreError, WriteOutcome};
use async_trait::async_trait;
use log::debug;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use std::path::Path;
use std::sync::Arc;

const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("index_records");

/// Relational-flavor backend: a single embedded `redb` table keyed by
/// `file_path`, with JSON-encoded record values.
///
/// Each write is one committed transaction; `insert` reports whether a
/// prior value was displaced, which gives the idempotent
/// created-vs-replaced outcome for free.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path)
            .map_err(|e| StoreError::backend(path.display().to_string(), e))?;
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn write(&self, record: IndexRecord) -> Result<WriteOutcome> {
        let key = record.file_path.clone();
        let bytes = serde_json::to_vec(&record).map_err(|e| StoreError::encode(&key, e))?;

        let db = Arc::clone(&self.db);
        let task_key = key.clone();
        let replaced = tokio::task::spawn_blocking(move || -> std::result::Result<bool, redb::Error> {
            let tx = db.begin_write()?;
            let replaced;
            {
                let mut table = tx.open_table(RECORDS)?;
                replaced = table.insert(task_key.as_str(), bytes.as_slice())?.is_some();
            }
            tx.commit()?;
            Ok(replaced)
        })
        .await
        .map_err(|e| StoreError::Task {
            path: key.clone(),
            source: e,
        })?
        .map_err(|e| StoreError::backend(&key, e))?;

        debug!("redb wrote {key} ({})", if replaced { "replaced" } else { "created" });
        Ok(if replaced {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }

    async fn get(&self, file_path: &str) -> Result<Option<IndexRecord>> {
        let db = Arc::clone(&self.db);
        let key = file_path.to_string();
        let task_key = key.clone();
        let bytes = tokio::task::spawn_blocking(
            move || -> std::result::Result<Option<Vec<u8>>, redb::Error> {
                let tx = db.begin_read()?;
                let table = match tx.open_table(RECORDS) {
                    Ok(table) => table,
                    Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };
                Ok(table.get(task_key.as_str())?.map(|guard| guard.value().to_vec()))
            },
        )
        .await
        .map_err(|e| StoreError::Task {
            path: key.clone(),
            source: e,
        })?
        .map_err(|e| StoreError::backend(&key, e))?;

        match bytes {
            Some(bytes) => {
                let record =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::encode(&key, e))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RedbStore;
    use crate::{DocumentStore, IndexRecord, WriteOutcome};
    use maildex_filter::{count, tokenize};
    use pretty_assertions::assert_eq;

    fn record(path: &str, body: &str) -> IndexRecord {
        let tokens = tokenize(body);
        IndexRecord::new(path, body, count(&tokens))
    }

    #[tokio::test]
    async fn write_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("index.redb")).unwrap();

        let outcome = store.write(record("inbox/1.txt", "hello world world\n")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Created);

        let loaded = store.get("inbox/1.txt").await.unwrap().unwrap();
        assert_eq!(loaded.frequency_map["hello"], 1);
        assert_eq!(loaded.frequency_map["world"], 2);
    }

    #[tokio::test]
    async fn reindexing_a_path_replaces_not_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("index.redb")).unwrap();

        assert_eq!(
            store.write(record("a.txt", "one\n")).await.unwrap(),
            WriteOutcome::Created
        );
        assert_eq!(
            store.write(record("a.txt", "two\n")).await.unwrap(),
            WriteOutcome::Replaced
        );

        let loaded = store.get("a.txt").await.unwrap().unwrap();
        assert_eq!(loaded.cleaned_content, "two\n");
    }

    #[tokio::test]
    async fn get_on_fresh_database_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("index.redb")).unwrap();
        assert!(store.get("missing.txt").await.unwrap().is_none());
    }
}

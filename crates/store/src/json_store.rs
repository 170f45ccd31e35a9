use crate::{DocumentStore, IndexRecord, Result, StoreError, WriteOutcome};
use async_trait::async_trait;
use log::debug;
use std::path::{Component, Path, PathBuf};

/// Document-store backend: one pretty-printed JSON file per record,
/// mirrored under `root` at `<file_path>.json`.
///
/// Writes go through a temp file and an atomic rename, so readers and
/// crashed writers never observe a torn record.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    root: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk location for a record key, rejecting
    /// anything that would escape the index root.
    fn record_path(&self, file_path: &str) -> Result<PathBuf> {
        let relative = Path::new(file_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if file_path.is_empty() || !safe {
            return Err(StoreError::InvalidPath(file_path.to_string()));
        }
        let mut path = self.root.join(relative);
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| StoreError::InvalidPath(file_path.to_string()))?;
        name.push(".json");
        path.set_file_name(name);
        Ok(path)
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn write(&self, record: IndexRecord) -> Result<WriteOutcome> {
        let key = record.file_path.clone();
        let path = self.record_path(&key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(&key, e))?;
        }

        let bytes = serde_json::to_vec_pretty(&record).map_err(|e| StoreError::encode(&key, e))?;
        let existed = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&key, e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io(&key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(&key, e))?;

        debug!("wrote {} ({})", path.display(), if existed { "replaced" } else { "created" });
        Ok(if existed {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }

    async fn get(&self, file_path: &str) -> Result<Option<IndexRecord>> {
        let path = self.record_path(file_path)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(file_path, e)),
        };
        let record = serde_json::from_slice(&bytes).map_err(|e| StoreError::encode(file_path, e))?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::JsonDocumentStore;
    use crate::{DocumentStore, IndexRecord, StoreError, WriteOutcome};
    use maildex_filter::{count, tokenize};
    use pretty_assertions::assert_eq;

    fn record(path: &str, body: &str) -> IndexRecord {
        let tokens = tokenize(body);
        IndexRecord::new(path, body, count(&tokens))
    }

    #[tokio::test]
    async fn write_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDocumentStore::new(dir.path());

        let outcome = store.write(record("inbox/1.txt", "hello world world\n")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Created);

        let loaded = store.get("inbox/1.txt").await.unwrap().unwrap();
        assert_eq!(loaded.file_name, "1.txt");
        assert_eq!(loaded.cleaned_content, "hello world world\n");
        assert_eq!(loaded.frequency_map["world"], 2);
    }

    #[tokio::test]
    async fn rewriting_a_path_replaces_the_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDocumentStore::new(dir.path());

        store.write(record("a.txt", "first\n")).await.unwrap();
        let outcome = store.write(record("a.txt", "second\n")).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Replaced);

        let loaded = store.get("a.txt").await.unwrap().unwrap();
        assert_eq!(loaded.cleaned_content, "second\n");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn empty_content_still_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDocumentStore::new(dir.path());

        store.write(record("empty.txt", "")).await.unwrap();
        let loaded = store.get("empty.txt").await.unwrap().unwrap();
        assert_eq!(loaded.cleaned_content, "");
        assert!(loaded.frequency_map.is_empty());
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDocumentStore::new(dir.path());

        let err = store.write(record("../outside.txt", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDocumentStore::new(dir.path());
        assert!(store.get("nope.txt").await.unwrap().is_none());
    }
}

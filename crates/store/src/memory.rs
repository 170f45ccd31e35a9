use crate::{DocumentStore, IndexRecord, Result, WriteOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process backend for tests and dry runs. Same replace-by-path
/// semantics as the durable backends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, IndexRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn write(&self, record: IndexRecord) -> Result<WriteOutcome> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let previous = records.insert(record.file_path.clone(), record);
        Ok(if previous.is_some() {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }

    async fn get(&self, file_path: &str) -> Result<Option<IndexRecord>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(file_path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::{DocumentStore, IndexRecord, WriteOutcome};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_distinct_writes_all_land() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let record =
                    IndexRecord::new(format!("mail/{i}.txt"), format!("body {i}"), Default::default());
                store.write(record).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), WriteOutcome::Created);
        }
        assert_eq!(store.len(), 32);
    }

    #[tokio::test]
    async fn replace_keeps_one_record() {
        let store = MemoryStore::new();
        store
            .write(IndexRecord::new("a.txt", "one", Default::default()))
            .await
            .unwrap();
        store
            .write(IndexRecord::new("a.txt", "two", Default::default()))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        let loaded = store.get("a.txt").await.unwrap().unwrap();
        assert_eq!(loaded.cleaned_content, "two");
    }
}

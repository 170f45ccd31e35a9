//! # Maildex Store
//!
//! The durable end of the ingest pipeline: [`IndexRecord`] is the
//! persisted unit (document identity + cleaned body + frequency map),
//! and [`DocumentStore`] is the capability every backend implements.
//!
//! Writes are idempotent by `file_path`: a repeated write for the same
//! path replaces the prior record, never duplicates it. Backends commit
//! atomically, so a crashed or cancelled write leaves either the old
//! record or the new one, never a torn one.
//!
//! Backends:
//! - [`JsonDocumentStore`]: one JSON document per record, mirrored
//!   under an index directory (document-store flavor).
//! - [`RedbStore`]: a single embedded `redb` table keyed by path
//!   (relational flavor).
//! - [`MemoryStore`]: in-process map, for tests and dry runs.

mod error;
mod json_store;
mod memory;
mod record;
mod redb_store;

pub use error::{Result, StoreError};
pub use json_store::JsonDocumentStore;
pub use memory::MemoryStore;
pub use record::{unix_now_ms, IndexRecord};
pub use redb_store::RedbStore;

use async_trait::async_trait;

/// What an idempotent write did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No record existed for this path before.
    Created,
    /// A prior record for this path was replaced.
    Replaced,
}

/// Capability: durably persist index records keyed by relative path.
///
/// Implementations must tolerate concurrent calls; callers share one
/// handle across worker tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `record`, replacing any prior record for the same
    /// `file_path`. Exactly one record per path survives.
    async fn write(&self, record: IndexRecord) -> Result<WriteOutcome>;

    /// Fetch the record stored for `file_path`, if any.
    async fn get(&self, file_path: &str) -> Result<Option<IndexRecord>>;
}

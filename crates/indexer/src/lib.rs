//! # Maildex Indexer
//!
//! Watch-clean-index orchestration for mail spools.
//!
//! ## Pipeline
//!
//! ```text
//! Directory tree
//!     │
//!     ├──> Watcher (recursive fs notifications)
//!     │      └─> one "created" event per new mail file
//!     │
//!     ├──> IngestWorker (per file, strictly sequential)
//!     │      read -> clean -> tokenize -> count
//!     │
//!     └──> DocumentStore
//!            └─> one IndexRecord per path, replaced on re-index
//! ```
//!
//! Each accepted event runs the full chain in its own task; a slow
//! store write never blocks detection of new files, and one file's
//! failure never aborts the watcher or its siblings.
//!
//! ## Example
//!
//! ```no_run
//! use maildex_indexer::{IngestConfig, IngestContext, WatchService};
//! use maildex_store::JsonDocumentStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> maildex_indexer::Result<()> {
//!     let store = Arc::new(JsonDocumentStore::new("/var/lib/maildex/index"));
//!     let ctx = IngestContext::new("/var/spool/mail-drop", store);
//!     let service = WatchService::start(ctx, IngestConfig::default())?;
//!     tokio::signal::ctrl_c().await?;
//!     let stats = service.shutdown().await?;
//!     println!("indexed {} files", stats.files);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod pipeline;
mod scanner;
mod stats;
mod watcher;

pub use config::IngestConfig;
pub use error::{IndexerError, Result};
pub use pipeline::{ingest_file, IngestContext, IngestFailure, IngestOutcome, Stage};
pub use scanner::scan_tree;
pub use stats::IngestStats;
pub use watcher::{IngestHealth, WatchService};

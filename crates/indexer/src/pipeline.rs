use crate::error::IndexerError;
use log::debug;
use maildex_filter::{count, tokenize, NoisePolicy};
use maildex_store::{DocumentStore, IndexRecord, WriteOutcome};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Where in the per-file chain a failure happened. Logged with the
/// path so an operator can resubmit the file by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Clean,
    Tokenize,
    Index,
    Store,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Clean => "clean",
            Self::Tokenize => "tokenize",
            Self::Index => "index",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one successful `Detected -> Stored` chain.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub file_path: String,
    pub outcome: WriteOutcome,
    pub tokens: usize,
}

/// Terminal failure of one chain; never retried automatically.
#[derive(Debug)]
pub struct IngestFailure {
    pub stage: Stage,
    pub path: PathBuf,
    pub error: IndexerError,
}

impl fmt::Display for IngestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stage {} failed for {}: {}",
            self.stage,
            self.path.display(),
            self.error
        )
    }
}

/// Everything one ingest invocation needs, constructed once by the
/// orchestrator and shared across worker tasks. No process-wide
/// singletons: the store handle and the noise policy live here.
#[derive(Clone)]
pub struct IngestContext {
    root: PathBuf,
    policy: NoisePolicy,
    store: Arc<dyn DocumentStore>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl IngestContext {
    pub fn new(root: impl Into<PathBuf>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            root: root.into(),
            policy: NoisePolicy::default(),
            store,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_policy(mut self, policy: NoisePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.read_timeout = read;
        self.write_timeout = write;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

/// Run the full chain for one file: read, clean, tokenize, count,
/// write. Strictly sequential within the file; callers provide the
/// concurrency across files.
///
/// Decode never fails: invalid UTF-8 is dropped by the lossy decode.
/// Read and store write are bounded by the context timeouts so a hung
/// mount or store cannot pin a worker forever.
pub async fn ingest_file(
    ctx: &IngestContext,
    path: &Path,
) -> std::result::Result<IngestOutcome, IngestFailure> {
    let fail = |stage: Stage, error: IndexerError| IngestFailure {
        stage,
        path: path.to_path_buf(),
        error,
    };

    let relative = path
        .strip_prefix(&ctx.root)
        .map(|rel| rel.to_string_lossy().into_owned())
        .map_err(|_| {
            fail(
                Stage::Read,
                IndexerError::InvalidRoot(format!(
                    "{} is not under {}",
                    path.display(),
                    ctx.root.display()
                )),
            )
        })?;

    let bytes = timeout(ctx.read_timeout, tokio::fs::read(path))
        .await
        .map_err(|_| {
            fail(
                Stage::Read,
                IndexerError::Timeout {
                    action: "reading file",
                    timeout: ctx.read_timeout,
                },
            )
        })?
        .map_err(|e| fail(Stage::Read, e.into()))?;
    let raw = String::from_utf8_lossy(&bytes);

    let cleaned = ctx.policy.clean(&raw);
    let tokens = tokenize(&cleaned);
    let frequency_map = count(&tokens);
    debug!("{relative}: {} tokens, {} distinct", tokens.len(), frequency_map.len());

    let record = IndexRecord::new(relative.clone(), cleaned, frequency_map);
    let outcome = timeout(ctx.write_timeout, ctx.store.write(record))
        .await
        .map_err(|_| {
            fail(
                Stage::Store,
                IndexerError::Timeout {
                    action: "writing index record",
                    timeout: ctx.write_timeout,
                },
            )
        })?
        .map_err(|e| fail(Stage::Store, e.into()))?;

    Ok(IngestOutcome {
        file_path: relative,
        outcome,
        tokens: tokens.len(),
    })
}

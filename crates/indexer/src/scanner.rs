use crate::pipeline::{ingest_file, IngestContext, IngestFailure, IngestOutcome};
use crate::{IndexerError, IngestConfig, IngestStats, Result};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// One-shot batch variant of the watch loop: walk the context root,
/// ingest every recognized file, return the totals.
///
/// Unreadable directory entries are logged and skipped; per-file
/// failures are logged and counted, never fatal for the walk.
pub async fn scan_tree(ctx: &IngestContext, config: &IngestConfig) -> Result<IngestStats> {
    let root = ctx.root().to_path_buf();
    if !root.is_dir() {
        return Err(IndexerError::InvalidRoot(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let walk_config = config.clone();
    let walk_root = root.clone();
    let candidates: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
        let mut found = Vec::new();
        for entry in WalkDir::new(&walk_root) {
            match entry {
                Ok(entry) if entry.file_type().is_file() && walk_config.recognizes(entry.path()) => {
                    found.push(entry.into_path());
                }
                Ok(_) => {}
                Err(err) => warn!("scan: {err}"),
            }
        }
        found
    })
    .await
    .map_err(|e| IndexerError::Other(format!("scan walk task failed: {e}")))?;

    info!(
        "scan found {} candidate files under {}",
        candidates.len(),
        root.display()
    );

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut tasks: JoinSet<std::result::Result<IngestOutcome, IngestFailure>> = JoinSet::new();
    for path in candidates {
        let ctx = ctx.clone();
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            ingest_file(&ctx, &path).await
        });
    }

    let mut stats = IngestStats::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(outcome)) => {
                info!(
                    "indexed {} ({} tokens, {:?})",
                    outcome.file_path, outcome.tokens, outcome.outcome
                );
                stats.record_success(outcome.outcome);
            }
            Ok(Err(failure)) => {
                error!("{failure}");
                stats.record_failure();
            }
            Err(join_err) => {
                error!("ingest task failed to complete: {join_err}");
                stats.record_failure();
            }
        }
    }
    Ok(stats)
}

use crate::pipeline::{ingest_file, IngestContext, IngestFailure, IngestOutcome};
use crate::{IndexerError, IngestConfig, IngestStats, Result};
use log::{error, info, warn};
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch, Mutex as TokioMutex, Semaphore};
use tokio::task::{JoinError, JoinSet};

/// Observable state of a running watch session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestHealth {
    pub files_indexed: u64,
    pub files_failed: u64,
    pub records_created: u64,
    pub records_replaced: u64,
    pub in_flight: usize,
    pub last_indexed_path: Option<String>,
    pub last_error: Option<String>,
}

enum WatcherCommand {
    Shutdown,
}

/// Long-running watch session: subscribes to creation events under the
/// context root and runs one ingest chain per accepted file.
///
/// Cheap to clone; the session ends when [`WatchService::shutdown`] is
/// called (in-flight files drain to completion first) or when the last
/// handle is dropped.
#[derive(Clone)]
pub struct WatchService {
    inner: Arc<WatchServiceInner>,
}

struct WatchServiceInner {
    command_tx: mpsc::Sender<WatcherCommand>,
    health_tx: watch::Sender<IngestHealth>,
    done_rx: TokioMutex<Option<oneshot::Receiver<IngestStats>>>,
    watcher: std::sync::Mutex<Option<RecommendedWatcher>>,
}

impl WatchService {
    /// Subscribe to the tree and start the ingest loop.
    ///
    /// Failure here is the one fatal condition: without a notification
    /// subscription the pipeline has no input, so the error propagates
    /// to the supervisor instead of being swallowed.
    pub fn start(ctx: IngestContext, config: IngestConfig) -> Result<Self> {
        let root = std::fs::canonicalize(ctx.root())
            .map_err(|e| IndexerError::InvalidRoot(format!("{}: {e}", ctx.root().display())))?;
        if !root.is_dir() {
            return Err(IndexerError::InvalidRoot(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let ctx = ctx.with_root(root);

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (health_tx, _health_rx) = watch::channel(IngestHealth::default());
        let (done_tx, done_rx) = oneshot::channel();

        let watcher = create_fs_watcher(ctx.root(), event_tx, config.notify_poll_interval)?;

        spawn_ingest_loop(ctx, config, event_rx, command_rx, health_tx.clone(), done_tx);

        Ok(Self {
            inner: Arc::new(WatchServiceInner {
                command_tx,
                health_tx,
                done_rx: TokioMutex::new(Some(done_rx)),
                watcher: std::sync::Mutex::new(Some(watcher)),
            }),
        })
    }

    /// Stop accepting events, let in-flight files finish, and return
    /// the session totals.
    pub async fn shutdown(&self) -> Result<IngestStats> {
        if let Ok(mut guard) = self.inner.watcher.lock() {
            guard.take();
        }
        let _ = self.inner.command_tx.send(WatcherCommand::Shutdown).await;

        let done_rx = self
            .inner
            .done_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| IndexerError::Other("watch service already shut down".to_string()))?;
        done_rx
            .await
            .map_err(|_| IndexerError::Other("ingest loop exited without reporting".to_string()))
    }

    #[must_use]
    pub fn health_snapshot(&self) -> IngestHealth {
        self.inner.health_tx.subscribe().borrow().clone()
    }

    #[must_use]
    pub fn health_stream(&self) -> watch::Receiver<IngestHealth> {
        self.inner.health_tx.subscribe()
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(WatcherCommand::Shutdown);
        }
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn spawn_ingest_loop(
    ctx: IngestContext,
    config: IngestConfig,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
    health_tx: watch::Sender<IngestHealth>,
    done_tx: oneshot::Sender<IngestStats>,
) {
    tokio::spawn(async move {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        let mut tasks: JoinSet<Option<std::result::Result<IngestOutcome, IngestFailure>>> =
            JoinSet::new();
        let mut recent = RecentPaths::new(Duration::from_millis(750));
        let mut stats = IngestStats::default();
        let mut health = IngestHealth::default();
        let mut accepting = true;

        loop {
            tokio::select! {
                event = event_rx.recv(), if accepting => match event {
                    Some(event) => {
                        for path in accepted_paths(&config, event, &mut recent) {
                            let ctx = ctx.clone();
                            let semaphore = Arc::clone(&semaphore);
                            tasks.spawn(async move {
                                // bounds files in flight; never closed
                                let _permit = semaphore.acquire_owned().await.ok()?;
                                run_chain(&ctx, &path).await
                            });
                        }
                        health.in_flight = tasks.len();
                        let _ = health_tx.send(health.clone());
                    }
                    None => accepting = false,
                },
                Some(cmd) = command_rx.recv() => match cmd {
                    WatcherCommand::Shutdown => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    apply_result(joined, &mut stats, &mut health);
                    health.in_flight = tasks.len();
                    let _ = health_tx.send(health.clone());
                }
                else => break,
            }
        }

        // drain: in-flight chains finish their file, no mid-pipeline abort
        while let Some(joined) = tasks.join_next().await {
            apply_result(joined, &mut stats, &mut health);
        }
        health.in_flight = 0;
        let _ = health_tx.send(health.clone());
        let _ = done_tx.send(stats);
    });
}

/// One `Detected -> Stored` chain, after the pre-pipeline filters.
async fn run_chain(
    ctx: &IngestContext,
    path: &Path,
) -> Option<std::result::Result<IngestOutcome, IngestFailure>> {
    // creation events for directories can carry a recognized suffix
    if let Ok(meta) = tokio::fs::metadata(path).await {
        if meta.is_dir() {
            return None;
        }
    }
    Some(ingest_file(ctx, path).await)
}

fn apply_result(
    joined: std::result::Result<Option<std::result::Result<IngestOutcome, IngestFailure>>, JoinError>,
    stats: &mut IngestStats,
    health: &mut IngestHealth,
) {
    match joined {
        Ok(Some(Ok(outcome))) => {
            info!(
                "indexed {} ({} tokens, {:?})",
                outcome.file_path, outcome.tokens, outcome.outcome
            );
            stats.record_success(outcome.outcome);
            health.last_indexed_path = Some(outcome.file_path);
        }
        Ok(Some(Err(failure))) => {
            error!("{failure}");
            stats.record_failure();
            health.last_error = Some(failure.to_string());
        }
        Ok(None) => {}
        Err(join_err) => {
            error!("ingest task failed to complete: {join_err}");
            stats.record_failure();
            health.last_error = Some(join_err.to_string());
        }
    }
    health.files_indexed = stats.files;
    health.files_failed = stats.failed;
    health.records_created = stats.created;
    health.records_replaced = stats.replaced;
}

fn accepted_paths(
    config: &IngestConfig,
    event: notify::Result<Event>,
    recent: &mut RecentPaths,
) -> Vec<PathBuf> {
    match event {
        Ok(event) => {
            if !is_create_like(&event.kind) {
                return Vec::new();
            }
            event
                .paths
                .into_iter()
                .filter(|path| config.recognizes(path))
                .filter(|path| recent.record_if_new(path))
                .collect()
        }
        Err(err) => {
            warn!("watcher error: {err}");
            Vec::new()
        }
    }
}

/// New-file events: plain creations plus renames into the tree, which
/// is how maildir-style delivery lands files.
fn is_create_like(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_))
        || matches!(
            kind,
            EventKind::Modify(ModifyKind::Name(
                RenameMode::To | RenameMode::Both | RenameMode::Any
            ))
        )
}

/// Sliding-window path dedup: notify backends may report the same new
/// file more than once (create + rename, or duplicate notifications).
struct RecentPaths {
    seen: VecDeque<(PathBuf, Instant)>,
    window: Duration,
}

impl RecentPaths {
    const fn new(window: Duration) -> Self {
        Self {
            seen: VecDeque::new(),
            window,
        }
    }

    fn record_if_new(&mut self, path: &Path) -> bool {
        let now = Instant::now();
        self.seen
            .retain(|(_, ts)| now.duration_since(*ts) <= self.window);
        let already = self.seen.iter().any(|(seen, _)| seen == path);
        if !already {
            self.seen.push_back((path.to_path_buf(), now));
        }
        !already
    }
}

#[cfg(test)]
mod tests {
    use super::{accepted_paths, is_create_like, RecentPaths};
    use crate::IngestConfig;
    use notify::event::{CreateKind, ModifyKind, RenameMode};
    use notify::{Event, EventKind};
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn create_and_rename_to_events_are_accepted() {
        assert!(is_create_like(&EventKind::Create(CreateKind::File)));
        assert!(is_create_like(&EventKind::Modify(ModifyKind::Name(
            RenameMode::To
        ))));
        assert!(!is_create_like(&EventKind::Modify(ModifyKind::Name(
            RenameMode::From
        ))));
        assert!(!is_create_like(&EventKind::Remove(
            notify::event::RemoveKind::File
        )));
    }

    #[test]
    fn duplicate_paths_within_the_window_are_deduped() {
        let mut recent = RecentPaths::new(Duration::from_secs(60));
        assert!(recent.record_if_new(Path::new("/spool/a.txt")));
        assert!(!recent.record_if_new(Path::new("/spool/a.txt")));
        assert!(recent.record_if_new(Path::new("/spool/b.txt")));
    }

    #[test]
    fn unrecognized_extensions_never_enter_the_pipeline() {
        let config = IngestConfig::default();
        let mut recent = RecentPaths::new(Duration::from_secs(60));
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path("/spool/a.txt".into())
            .add_path("/spool/skip.md".into());
        let accepted = accepted_paths(&config, Ok(event), &mut recent);
        assert_eq!(accepted, vec![std::path::PathBuf::from("/spool/a.txt")]);
    }

    #[test]
    fn watcher_errors_yield_no_paths() {
        let config = IngestConfig::default();
        let mut recent = RecentPaths::new(Duration::from_secs(60));
        let err = notify::Error::generic("backend hiccup");
        assert!(accepted_paths(&config, Err(err), &mut recent).is_empty());
    }
}

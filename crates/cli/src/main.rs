//! `maildex` binary: thin front-end over `maildex-indexer`. Supplies
//! the watched directory and store parameters, nothing more.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use maildex_indexer::{scan_tree, IngestConfig, IngestContext, IngestStats, WatchService};
use maildex_store::{DocumentStore, JsonDocumentStore, RedbStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "maildex",
    version,
    about = "Watch a mail drop directory, strip header noise, and keep a per-document word-frequency index"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch a directory tree and index new mail files as they arrive
    Watch(IngestArgs),
    /// Index every recognized file under a directory tree once
    Scan(IngestArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Directory tree to ingest
    root: PathBuf,

    /// Directory for the JSON document store backend
    #[arg(long, conflicts_with = "redb", default_value = "maildex-index")]
    store_dir: PathBuf,

    /// Use an embedded redb database at this path instead
    #[arg(long)]
    redb: Option<PathBuf>,

    /// Recognized mail-file extensions
    #[arg(long, value_delimiter = ',', default_values_t = vec!["txt".to_string(), "eml".to_string()])]
    ext: Vec<String>,

    /// Maximum files processed in flight
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Seconds allowed for one file read
    #[arg(long, default_value_t = 10)]
    read_timeout: u64,

    /// Seconds allowed for one store write
    #[arg(long, default_value_t = 30)]
    write_timeout: u64,
}

impl IngestArgs {
    fn store(&self) -> anyhow::Result<Arc<dyn DocumentStore>> {
        match &self.redb {
            Some(path) => {
                let store = RedbStore::open(path)
                    .with_context(|| format!("opening redb store at {}", path.display()))?;
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(JsonDocumentStore::new(&self.store_dir))),
        }
    }

    fn context(&self) -> anyhow::Result<IngestContext> {
        Ok(IngestContext::new(&self.root, self.store()?).with_timeouts(
            Duration::from_secs(self.read_timeout),
            Duration::from_secs(self.write_timeout),
        ))
    }

    fn config(&self) -> IngestConfig {
        IngestConfig {
            extensions: self.ext.iter().map(|ext| ext.to_lowercase()).collect(),
            concurrency: self.concurrency,
            ..IngestConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Watch(args) => watch(&args).await,
        Command::Scan(args) => scan(&args).await,
    }
}

async fn watch(args: &IngestArgs) -> anyhow::Result<()> {
    let service = WatchService::start(args.context()?, args.config())
        .with_context(|| format!("watching {}", args.root.display()))?;
    info!("watching {} (ctrl-c to stop)", args.root.display());

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested, draining in-flight files");

    let stats = service.shutdown().await?;
    report(&stats);
    Ok(())
}

async fn scan(args: &IngestArgs) -> anyhow::Result<()> {
    let stats = scan_tree(&args.context()?, &args.config())
        .await
        .with_context(|| format!("scanning {}", args.root.display()))?;
    report(&stats);
    if stats.failed > 0 {
        anyhow::bail!("{} file(s) failed; see the log for paths to resubmit", stats.failed);
    }
    Ok(())
}

fn report(stats: &IngestStats) {
    println!(
        "indexed {} file(s) ({} created, {} replaced), {} failed",
        stats.files, stats.created, stats.replaced, stats.failed
    );
}

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] maildex_store::StoreError),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid watch root: {0}")]
    InvalidRoot(String),

    #[error("timed out after {timeout:?} while {action}")]
    Timeout {
        action: &'static str,
        timeout: Duration,
    },

    #[error("{0}")]
    Other(String),
}

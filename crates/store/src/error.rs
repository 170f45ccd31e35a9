use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store failures always carry the record path they relate to, so the
/// caller can log and resubmit without extra bookkeeping.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O failure for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("record encoding failed for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage backend failure for {path}: {source}")]
    Backend {
        path: String,
        #[source]
        source: redb::Error,
    },

    #[error("storage task failed for {path}: {source}")]
    Task {
        path: String,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("invalid record path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn encode(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Encode {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn backend(path: impl Into<String>, source: impl Into<redb::Error>) -> Self {
        Self::Backend {
            path: path.into(),
            source: source.into(),
        }
    }
}

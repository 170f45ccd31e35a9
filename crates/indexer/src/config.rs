use std::path::Path;
use std::time::Duration;

/// Orchestration knobs for the watcher and the batch scanner.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// File extensions accepted into the pipeline, lowercase, no dot.
    pub extensions: Vec<String>,
    /// Maximum files in flight at once.
    pub concurrency: usize,
    /// Fallback poll interval handed to the notify backend.
    pub notify_poll_interval: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string(), "eml".to_string()],
            concurrency: 8,
            notify_poll_interval: Duration::from_secs(2),
        }
    }
}

impl IngestConfig {
    /// Whether a path carries a recognized mail-file extension.
    ///
    /// Directories and extensionless paths never qualify; this is the
    /// filter applied before anything enters the pipeline.
    pub fn recognizes(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|known| known == &ext)
            })
            .unwrap_or(false)
    }
}

use maildex_store::WriteOutcome;
use serde::Serialize;

/// Counters for one watch session or one batch scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Files that completed the full chain.
    pub files: u64,
    /// Files that terminated in `Failed(stage)`.
    pub failed: u64,
    /// Successful writes that created a new record.
    pub created: u64,
    /// Successful writes that replaced a prior record.
    pub replaced: u64,
}

impl IngestStats {
    pub(crate) fn record_success(&mut self, outcome: WriteOutcome) {
        self.files += 1;
        match outcome {
            WriteOutcome::Created => self.created += 1,
            WriteOutcome::Replaced => self.replaced += 1,
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed += 1;
    }
}

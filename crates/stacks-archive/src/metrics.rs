//! Metrics collection for archival operations

/// Metrics collected during archival sweeps
///
/// Tracks entries scanned, selected, archived, and failed per sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveMetrics {
    /// Durable-tier entries examined across all sweeps
    pub scanned: usize,

    /// Entries that matched the selection rule
    pub selected: usize,

    /// Entries successfully moved to the archival tier
    pub archived: usize,

    /// Candidates that failed mid-archive and were skipped
    pub failed: usize,

    /// Total sweep iterations completed
    pub sweep_count: usize,

    /// Total sweep runtime in seconds
    pub total_runtime_secs: u64,
}

impl ArchiveMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one sweep
    pub fn record_sweep(&mut self, scanned: usize, selected: usize, archived: usize, failed: usize) {
        self.scanned += scanned;
        self.selected += selected;
        self.archived += archived;
        self.failed += failed;
        self.sweep_count += 1;
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Archive Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Sweep cycles: {}", self.sweep_count),
            format!("Total runtime: {}s", self.total_runtime_secs),
            format!("Scanned: {}", self.scanned),
            format!("Selected: {}", self.selected),
            format!("Archived: {}", self.archived),
            format!("Failed: {}", self.failed),
        ]
        .join("\n")
    }
}

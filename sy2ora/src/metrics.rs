//! Conversion metrics.
//!
//! Counters go through the `metrics` facade. They are only exported when `enable_metrics` is set,
//! in which case the axum-prometheus recorder renders them alongside the HTTP metrics at
//! `/internal/metrics`; otherwise recording is a no-op.

/// Name of the per-file counter, labelled by `outcome`.
pub const FILES_TOTAL: &str = "sy2ora_files_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Backend answered and SQL was extracted
    Converted,
    /// Backend call failed, placeholder returned
    Failed,
    /// Extension not eligible
    Skipped,
}

impl FileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileOutcome::Converted => "converted",
            FileOutcome::Failed => "failed",
            FileOutcome::Skipped => "skipped",
        }
    }
}

pub fn record_file_outcome(outcome: FileOutcome) {
    metrics::counter!(FILES_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

//! Port for row-count progress feedback.

/// `ProgressSink` receives the row count of the table being written.
///
/// The engine calls `update` exactly when the count reaches a multiple of
/// `PROGRESS_INTERVAL` and `finish` once after the last row. Implementations
/// decide how to render it; they must not fail or block the export.
pub trait ProgressSink: Send + Sync {
    fn update(&self, rows: u64);
    fn finish(&self, rows: u64);
}

/// Rows between two `update` calls.
pub const PROGRESS_INTERVAL: u64 = 10_000;

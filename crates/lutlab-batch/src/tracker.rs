//! Per-item outcome reporting.
//!
//! A [`TaskTracker`] receives one [`ItemOutcome`] per batch item, from
//! worker threads and in completion order, followed by a single
//! [`BatchSummary`] once the batch is over.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Result of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Item completed.
    Succeeded,
    /// Item failed; siblings keep running.
    Failed(String),
    /// Item was not started because the batch was cancelled.
    Interrupted,
}

/// Aggregate counts of a finished batch.
///
/// `processed` counts items that were started (`succeeded + failed`);
/// interrupted items were never started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Items started.
    pub processed: usize,
    /// Items that completed.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// Items skipped after cancellation.
    pub interrupted: usize,
}

impl BatchSummary {
    /// Tallies a list of outcomes.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ItemOutcome>) -> Self {
        let mut s = Self::default();
        for o in outcomes {
            match o {
                ItemOutcome::Succeeded => s.succeeded += 1,
                ItemOutcome::Failed(_) => s.failed += 1,
                ItemOutcome::Interrupted => s.interrupted += 1,
            }
        }
        s.processed = s.succeeded + s.failed;
        s
    }

    /// Total number of items in the batch.
    pub fn total(&self) -> usize {
        self.processed + self.interrupted
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {} ({} succeeded, {} failed), {} interrupted",
            self.processed, self.succeeded, self.failed, self.interrupted
        )
    }
}

/// Receiver of batch progress.
pub trait TaskTracker: Send + Sync {
    /// Called once per item, from the worker that handled it.
    fn item_finished(&self, index: usize, label: &str, outcome: &ItemOutcome);

    /// Called once after every item has reported.
    fn batch_finished(&self, summary: &BatchSummary);
}

/// Tracker that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracker;

impl TaskTracker for NullTracker {
    fn item_finished(&self, _index: usize, _label: &str, _outcome: &ItemOutcome) {}

    fn batch_finished(&self, _summary: &BatchSummary) {}
}

/// Tracker that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl TaskTracker for LogTracker {
    fn item_finished(&self, index: usize, label: &str, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Succeeded => info!(index, item = label, "item succeeded"),
            ItemOutcome::Failed(msg) => warn!(index, item = label, error = %msg, "item failed"),
            ItemOutcome::Interrupted => info!(index, item = label, "item interrupted"),
        }
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "batch complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts() {
        let outcomes = [
            ItemOutcome::Succeeded,
            ItemOutcome::Failed("bad".into()),
            ItemOutcome::Interrupted,
            ItemOutcome::Succeeded,
        ];
        let s = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(
            s,
            BatchSummary {
                processed: 3,
                succeeded: 2,
                failed: 1,
                interrupted: 1
            }
        );
        assert_eq!(s.total(), 4);
        assert_eq!(s.to_string(), "processed: 3 (2 succeeded, 1 failed), 1 interrupted");
    }
}

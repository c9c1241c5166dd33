//! Bounded worker pool running independent items.

use crate::{BatchError, BatchResult, BatchSummary, CancelToken, ItemOutcome, NullTracker, TaskTracker};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Outcome of every item plus the values produced by successful ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<R> {
    /// One outcome per input item, in input order.
    pub outcomes: Vec<ItemOutcome>,
    /// Value of each succeeded item, `None` otherwise.
    pub results: Vec<Option<R>>,
    /// Aggregate counts.
    pub summary: BatchSummary,
}

/// Runs batch items on a dedicated rayon pool.
///
/// Items are independent: a failing or panicking item is recorded as
/// [`ItemOutcome::Failed`] and its siblings keep running. The [`CancelToken`] is checked before each item starts; items
/// reached after cancellation report [`ItemOutcome::Interrupted`].
pub struct BatchRunner {
    pool: ThreadPool,
    cancel: CancelToken,
    progress: Arc<AtomicUsize>,
    tracker: Arc<dyn TaskTracker>,
}

impl BatchRunner {
    /// Creates a runner with `threads` workers (`None` = available cores).
    pub fn new(threads: Option<usize>) -> BatchResult<Self> {
        let threads = threads.filter(|&n| n > 0).unwrap_or_else(default_threads);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lutlab-batch-{i}"))
            .build()
            .map_err(|e| BatchError::Pool(e.to_string()))?;
        debug!(threads, "batch pool ready");
        Ok(Self {
            pool,
            cancel: CancelToken::new(),
            progress: Arc::new(AtomicUsize::new(0)),
            tracker: Arc::new(NullTracker),
        })
    }

    /// Replaces the task tracker.
    pub fn with_tracker(mut self, tracker: Arc<dyn TaskTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this runner's batches.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Items finished (succeeded or failed) so far, across all batches of
    /// this runner.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::SeqCst)
    }

    /// Shared handle to the progress counter.
    pub fn progress_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.progress)
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `work` on every item.
    ///
    /// `label` names an item for the tracker and logs.
    pub fn run<T, R, L, F>(&self, items: &[T], label: L, work: F) -> BatchReport<R>
    where
        T: Sync,
        R: Send,
        L: Fn(&T) -> String + Sync,
        F: Fn(&T) -> BatchResult<R> + Sync,
    {
        info!(items = items.len(), threads = self.threads(), "starting batch");

        let per_item: Vec<(ItemOutcome, Option<R>)> = self.pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    let (outcome, value) = if self.cancel.is_cancelled() {
                        (ItemOutcome::Interrupted, None)
                    } else {
                        let result = catch_unwind(AssertUnwindSafe(|| work(item)));
                        self.progress.fetch_add(1, Ordering::SeqCst);
                        match result {
                            Ok(Ok(v)) => (ItemOutcome::Succeeded, Some(v)),
                            Ok(Err(e)) => (ItemOutcome::Failed(e.to_string()), None),
                            Err(payload) => {
                                let msg = panic_message(payload.as_ref());
                                warn!(index, error = %msg, "item panicked");
                                (ItemOutcome::Failed(format!("panicked: {msg}")), None)
                            }
                        }
                    };
                    self.tracker.item_finished(index, &label(item), &outcome);
                    (outcome, value)
                })
                .collect()
        });

        let (outcomes, results): (Vec<_>, Vec<_>) = per_item.into_iter().unzip();
        let summary = BatchSummary::from_outcomes(&outcomes);
        self.tracker.batch_finished(&summary);
        BatchReport {
            outcomes,
            results,
            summary,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

//! # lutlab-batch
//!
//! Best-effort parallel batches over many independent items.
//!
//! - [`BatchRunner`] - Bounded rayon pool with an atomic progress counter
//! - [`CancelToken`] - Stops new items from starting
//! - [`TaskTracker`] - Receives per-item outcomes and the final summary
//! - [`ApplyJob`] - Apply a lattice to a PNG file
//!
//! A failing item never aborts the batch: its error is recorded as
//! [`ItemOutcome::Failed`] and the other items continue. Outputs already
//! written when a batch is cancelled stay on disk.
//!
//! # Example
//!
//! ```rust
//! use lutlab_batch::{BatchRunner, ItemOutcome};
//!
//! let runner = BatchRunner::new(Some(2)).unwrap();
//! let report = runner.run(&[1, 2, 3], |n| n.to_string(), |&n| Ok(n * 10));
//! assert_eq!(report.summary.succeeded, 3);
//! assert_eq!(report.results, vec![Some(10), Some(20), Some(30)]);
//! assert!(report.outcomes.iter().all(|o| *o == ItemOutcome::Succeeded));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cancel;
mod error;
pub mod jobs;
mod runner;
mod tracker;

pub use cancel::CancelToken;
pub use error::{BatchError, BatchResult};
pub use jobs::{ApplyJob, analyze_file, apply_file, lut_id_for};
pub use runner::{BatchReport, BatchRunner};
pub use tracker::{BatchSummary, ItemOutcome, LogTracker, NullTracker, TaskTracker};

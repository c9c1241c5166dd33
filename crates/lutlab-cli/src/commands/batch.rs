//! Batch LUT application.

use crate::BatchArgs;
use crate::config::EngineConfig;
use anyhow::{Result, bail};
use lutlab_batch::{ApplyJob, BatchRunner, ItemOutcome, LogTracker};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, trace};

/// Applies one LUT to every image matching a pattern.
///
/// Outputs keep their file names under the output directory. Failed items
/// are reported and the command fails after the whole batch has run.
pub fn run(args: BatchArgs, config: &EngineConfig) -> Result<()> {
    trace!(pattern = %args.input, lut = %args.lut.display(), "batch::run");

    let files: Vec<PathBuf> = glob::glob(&args.input)?.filter_map(|r| r.ok()).collect();
    if files.is_empty() {
        bail!("No files match pattern: {}", args.input);
    }

    let lattice = Arc::new(super::load_lut(&args.lut)?.lattice);
    std::fs::create_dir_all(&args.output)?;

    let jobs: Vec<ApplyJob> = files
        .into_iter()
        .filter_map(|input| {
            let name = input.file_name()?.to_owned();
            Some(ApplyJob {
                output: args.output.join(name),
                input,
                lattice: Arc::clone(&lattice),
            })
        })
        .collect();
    info!(files = jobs.len(), pattern = %args.input, "Starting batch processing");

    let runner = BatchRunner::new(Some(config.threads))?.with_tracker(Arc::new(LogTracker));
    let report = runner.apply_batch(&jobs);

    for (job, outcome) in jobs.iter().zip(&report.outcomes) {
        if let ItemOutcome::Failed(msg) = outcome {
            eprintln!("Error: {}: {}", job.input.display(), msg);
        }
    }
    println!("{}", report.summary);

    if report.summary.failed > 0 {
        bail!("{} files failed", report.summary.failed);
    }
    Ok(())
}

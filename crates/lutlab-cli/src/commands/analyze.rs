//! LUT analysis command.

use crate::AnalyzeArgs;
use crate::config::EngineConfig;
use anyhow::{Context, Result, bail};
use lutlab_analysis::LutAnalysis;
use lutlab_batch::{BatchRunner, ItemOutcome, LogTracker};
use std::sync::Arc;
use tracing::info;

/// Analyzes LUT files in parallel and writes the analyses as a JSON array.
///
/// Files that fail to parse are reported and skipped; the command only
/// fails when nothing could be analyzed.
pub fn run(args: AnalyzeArgs, config: &EngineConfig) -> Result<()> {
    let files = super::expand_inputs(&args.input)?;
    let runner = BatchRunner::new(Some(config.threads))?.with_tracker(Arc::new(LogTracker));
    let report = runner.analyze_batch(&files, &config.thresholds);

    for (path, outcome) in files.iter().zip(&report.outcomes) {
        if let ItemOutcome::Failed(msg) = outcome {
            eprintln!("Error: {}: {}", path.display(), msg);
        }
    }

    let analyses: Vec<LutAnalysis> = report.results.into_iter().flatten().collect();
    if analyses.is_empty() {
        bail!("No LUT could be analyzed");
    }

    let json = serde_json::to_string_pretty(&analyses)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write: {}", path.display()))?;
            info!(luts = analyses.len(), output = %path.display(), "analyses written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

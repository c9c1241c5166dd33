//! Distillation command.

use crate::DistillArgs;
use anyhow::{Context, Result, bail};
use lutlab_cluster::DistillMode;

/// Flags (or clears) redundant members of a run and saves the forest.
pub fn run(args: DistillArgs) -> Result<()> {
    if !args.forest.exists() {
        bail!("Forest not found: {}", args.forest.display());
    }
    let engine = super::open_engine(None, &args.forest)?;

    if args.clear {
        let cleared = engine.clear_distilled(args.run)?;
        super::save_forest(&engine, &args.forest)?;
        println!("run {}: {} flags cleared", args.run, cleared);
        return Ok(());
    }

    let mode = parse_mode(&args.mode, args.eps)?;
    let report = engine
        .distill(args.run, mode)
        .with_context(|| format!("Distilling run {} failed", args.run))?;
    super::save_forest(&engine, &args.forest)?;

    println!("run {}: {} kept, {} flagged", report.run_id, report.kept, report.flagged);
    Ok(())
}

fn parse_mode(mode: &str, eps: f64) -> Result<DistillMode> {
    match mode.to_ascii_lowercase().as_str() {
        "center" | "center-radius" => Ok(DistillMode::CenterRadius(eps)),
        "pairwise" => Ok(DistillMode::Pairwise(eps)),
        other => bail!("Unknown distill mode: {other} (expected center or pairwise)"),
    }
}

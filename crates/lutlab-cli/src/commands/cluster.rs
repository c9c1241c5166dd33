//! Clustering and drill-down commands.
//!
//! Both load features from an analysis file and keep the forest in a JSON
//! file between invocations.

use crate::config::EngineConfig;
use crate::{ClusterArgs, DrillArgs, ParamArgs};
use anyhow::{Context, Result};
use lutlab_cluster::{ClusterAlgorithm, ClusterEngine, ClusterParams, ClusterRun, Metric};

/// Clusters analyzed LUTs into a new tree.
pub fn run(args: ClusterArgs, config: &EngineConfig) -> Result<()> {
    let params = params(&args.params, config)?;
    let engine = super::open_engine(Some(&args.analysis), &args.forest)?;

    let ids = (!args.ids.is_empty()).then_some(args.ids.as_slice());
    let run = engine.cluster(ids, &params).context("Clustering failed")?;

    super::save_forest(&engine, &args.forest)?;
    print_run(&engine, &run);
    Ok(())
}

/// Re-clusters one cluster of an existing tree.
pub fn drill(args: DrillArgs, config: &EngineConfig) -> Result<()> {
    let params = params(&args.params, config)?;
    let engine = super::open_engine(Some(&args.analysis), &args.forest)?;

    let run = engine
        .drill_down(args.tree, &args.path, &params)
        .with_context(|| format!("Drill-down into {} of tree {} failed", args.path, args.tree))?;

    super::save_forest(&engine, &args.forest)?;
    print_run(&engine, &run);
    Ok(())
}

fn params(args: &ParamArgs, config: &EngineConfig) -> Result<ClusterParams> {
    let metric = args
        .metric
        .as_deref()
        .map(str::parse::<Metric>)
        .transpose()
        .context("Invalid --metric")?;
    let algorithm = args
        .algorithm
        .as_deref()
        .map(str::parse::<ClusterAlgorithm>)
        .transpose()
        .context("Invalid --algorithm")?;
    Ok(config.cluster_params(args.k, args.seed, algorithm, metric))
}

fn print_run(engine: &ClusterEngine, run: &ClusterRun) {
    let forest = engine.forest();
    println!(
        "run {} (tree {}, level {}): k={} metric={} algorithm={}",
        run.run_id,
        run.tree_id,
        run.level(),
        run.k,
        run.metric,
        run.algorithm
    );
    for r in forest.run_records(run.run_id) {
        println!("  {:<8} {:<24} {:.4}", r.path, r.lut_id, r.distance_to_center);
    }
}

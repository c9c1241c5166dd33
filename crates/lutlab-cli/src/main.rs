//! lutlab - 3D LUT toolkit CLI
//!
//! Parses `.cube` files, grades images, derives LUT features and groups
//! LUTs into drillable clusters.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::EngineConfig;

#[derive(Parser)]
#[command(name = "lutlab")]
#[command(author, version, about = "3D LUT parsing, grading and clustering")]
#[command(long_about = "
Tools for working with .cube 3D LUTs.

Examples:
  lutlab info look.cube                          # Show LUT info
  lutlab apply shot.png -l look.cube -o out.png  # Grade one image
  lutlab batch 'plates/*.png' -l look.cube -o graded/
  lutlab analyze 'luts/*.cube' -o analysis.json
  lutlab cluster -a analysis.json -f forest.json -k 4
  lutlab drill -a analysis.json -f forest.json --tree 0 --path 1 -k 2
  lutlab distill -f forest.json --run 0 --mode pairwise --eps 0.1
  lutlab snapshot -f forest.json --run 0 --name first-pass
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display LUT information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Apply a LUT to one image
    Apply(ApplyArgs),

    /// Apply a LUT to many images
    Batch(BatchArgs),

    /// Extract features and tags from LUT files
    Analyze(AnalyzeArgs),

    /// Cluster analyzed LUTs into a new tree
    Cluster(ClusterArgs),

    /// Re-cluster the members of one cluster
    Drill(DrillArgs),

    /// Flag redundant members of a run
    Distill(DistillArgs),

    /// Freeze a run's membership as a named snapshot
    Snapshot(SnapshotArgs),

    /// List stored snapshots
    Snapshots(SnapshotsArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input .cube file(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input PNG
    input: PathBuf,

    /// LUT file (.cube)
    #[arg(short, long)]
    lut: PathBuf,

    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct BatchArgs {
    /// Input pattern (glob, e.g. "plates/*.png")
    input: String,

    /// LUT file (.cube)
    #[arg(short, long)]
    lut: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// LUT files or glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// Write analyses as JSON here (stdout otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ClusterArgs {
    /// Analysis JSON written by `analyze`
    #[arg(short, long)]
    analysis: PathBuf,

    /// Forest file (created if missing, updated in place)
    #[arg(short, long)]
    forest: PathBuf,

    /// LUT ids to cluster (default: every analyzed LUT)
    ids: Vec<String>,

    #[command(flatten)]
    params: ParamArgs,
}

#[derive(Args)]
struct DrillArgs {
    /// Analysis JSON written by `analyze`
    #[arg(short, long)]
    analysis: PathBuf,

    /// Forest file
    #[arg(short, long)]
    forest: PathBuf,

    /// Tree id
    #[arg(long)]
    tree: u64,

    /// Path of the cluster to drill into (e.g. "1" or "1-0")
    #[arg(long)]
    path: String,

    #[command(flatten)]
    params: ParamArgs,
}

/// Clustering flags shared by `cluster` and `drill`; unset flags fall back
/// to the config file.
#[derive(Args)]
struct ParamArgs {
    /// Number of clusters
    #[arg(short)]
    k: Option<usize>,

    /// Feature dimensions, e.g. "h_mean,s_mean" or "z:h_mean,s_mean"
    #[arg(short, long)]
    metric: Option<String>,

    /// kmeans | agglomerative[-single|-complete|-average]
    #[arg(long)]
    algorithm: Option<String>,

    /// Initialization seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct DistillArgs {
    /// Forest file
    #[arg(short, long)]
    forest: PathBuf,

    /// Run id
    #[arg(long)]
    run: u64,

    /// center | pairwise
    #[arg(long, default_value = "center")]
    mode: String,

    /// Redundancy radius
    #[arg(long, default_value = "0.0")]
    eps: f64,

    /// Clear flags instead of computing them
    #[arg(long)]
    clear: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Forest file
    #[arg(short, long)]
    forest: PathBuf,

    /// Run id
    #[arg(long)]
    run: u64,

    /// Snapshot name
    #[arg(short, long)]
    name: String,

    /// Snapshot directory (overrides config)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Reject names already in use
    #[arg(long)]
    unique: bool,
}

#[derive(Args)]
struct SnapshotsArgs {
    /// Snapshot directory (overrides config)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Only snapshots with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    let verbose = cli.verbose > 0;

    // Configure thread pool
    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Info(args) => commands::info::run(args, verbose),
        Commands::Apply(args) => commands::apply::run(args),
        Commands::Batch(args) => commands::batch::run(args, &config),
        Commands::Analyze(args) => commands::analyze::run(args, &config),
        Commands::Cluster(args) => commands::cluster::run(args, &config),
        Commands::Drill(args) => commands::cluster::drill(args, &config),
        Commands::Distill(args) => commands::distill::run(args),
        Commands::Snapshot(args) => commands::snapshot::run(args, &config),
        Commands::Snapshots(args) => commands::snapshot::list(args, &config),
    }
}

/// Installs the log subscriber; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

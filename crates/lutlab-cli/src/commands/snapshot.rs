//! Snapshot commands.

use crate::config::EngineConfig;
use crate::{SnapshotArgs, SnapshotsArgs};
use anyhow::{Context, Result, bail};
use lutlab_cluster::{NamePolicy, SnapshotStore};
use std::path::Path;

/// Commits a snapshot of a run to the snapshot directory.
pub fn run(args: SnapshotArgs, config: &EngineConfig) -> Result<()> {
    if !args.forest.exists() {
        bail!("Forest not found: {}", args.forest.display());
    }
    let engine = super::open_engine(None, &args.forest)?;
    let snapshot = engine.snapshot_of(args.run, &args.name)?;

    let policy = if args.unique {
        NamePolicy::Unique
    } else {
        config.snapshots.name_policy
    };
    let dir = args.dir.as_deref().unwrap_or(&config.snapshots.dir);
    let store = open_store(dir, policy)?;
    let id = store
        .commit(&snapshot)
        .with_context(|| format!("Failed to commit snapshot '{}'", args.name))?;

    println!("{id}  {}  ({} clusters)", snapshot.name, snapshot.n_clusters);
    Ok(())
}

/// Lists snapshots, oldest first.
pub fn list(args: SnapshotsArgs, config: &EngineConfig) -> Result<()> {
    let dir = args.dir.as_deref().unwrap_or(&config.snapshots.dir);
    let store = open_store(dir, config.snapshots.name_policy)?;
    let snapshots = match &args.name {
        Some(name) => store.find_by_name(name)?,
        None => store.list()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }
    for s in &snapshots {
        let members: usize = s.membership.values().map(Vec::len).sum();
        println!(
            "{}  {:<20} {}  k={} luts={} algorithm={}",
            s.id,
            s.name,
            s.created_at.format("%Y-%m-%d %H:%M:%S"),
            s.n_clusters,
            members,
            s.algorithm
        );
    }
    Ok(())
}

fn open_store(dir: &Path, policy: NamePolicy) -> Result<SnapshotStore> {
    SnapshotStore::open_dir(dir, policy)
        .with_context(|| format!("Failed to open snapshot store: {}", dir.display()))
}

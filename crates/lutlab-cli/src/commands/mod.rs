//! CLI command implementations

pub mod analyze;
pub mod apply;
pub mod batch;
pub mod cluster;
pub mod distill;
pub mod info;
pub mod snapshot;

use anyhow::{Context, Result, bail};
use lutlab_analysis::LutAnalysis;
use lutlab_cluster::{ClusterEngine, ClusterForest};
use lutlab_lut::cube::{self, ParsedCube};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Load a .cube file, logging parser warnings
pub fn load_lut(path: &Path) -> Result<ParsedCube> {
    let parsed = cube::read_3d(path).with_context(|| format!("Failed to load LUT: {}", path.display()))?;
    for w in &parsed.warnings {
        warn!(path = %path.display(), "{w}");
    }
    Ok(parsed)
}

/// Expand file arguments that may be glob patterns
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        for entry in glob::glob(pattern).with_context(|| format!("Bad pattern: {pattern}"))? {
            files.push(entry?);
        }
        if files.len() == before {
            // nothing matched: keep the literal path
            files.push(PathBuf::from(pattern));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Load analyses written by `analyze`
pub fn load_analyses(path: &Path) -> Result<Vec<LutAnalysis>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid analysis file: {}", path.display()))
}

/// Build an engine from an analysis file and an optional existing forest
pub fn open_engine(analysis: Option<&Path>, forest: &Path) -> Result<ClusterEngine> {
    let engine = if forest.exists() {
        let loaded = ClusterForest::load(forest).with_context(|| format!("Failed to load forest: {}", forest.display()))?;
        ClusterEngine::with_forest(loaded)
    } else {
        ClusterEngine::new()
    };
    if let Some(path) = analysis {
        let analyses = load_analyses(path)?;
        if analyses.is_empty() {
            bail!("No analyses in {}", path.display());
        }
        for a in analyses {
            engine.upsert_features(a.lut_id, a.features);
        }
    }
    Ok(engine)
}

/// Write the engine's forest back to disk
pub fn save_forest(engine: &ClusterEngine, path: &Path) -> Result<()> {
    engine
        .forest()
        .save(path)
        .with_context(|| format!("Failed to save forest: {}", path.display()))
}

//! `lutlab.yaml` configuration.
//!
//! Every field is optional; missing keys fall back to defaults, and
//! command-line flags override whatever the file sets.
//!
//! ```yaml
//! threads: 8
//! thresholds:
//!   sat_low: 0.25
//! cluster:
//!   default_k: 6
//!   seed: 42
//!   algorithm: { kind: agglomerative, linkage: complete }
//!   metric: { dims: [h_mean, s_mean], standardize: true }
//! snapshots:
//!   dir: ./snapshots
//!   name_policy: unique
//! ```

use anyhow::{Context, Result};
use lutlab_analysis::Thresholds;
use lutlab_cluster::{ClusterAlgorithm, ClusterParams, Metric, NamePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Batch worker threads (`0` = available cores).
    pub threads: usize,
    /// Classifier boundaries.
    pub thresholds: Thresholds,
    /// Clustering defaults.
    pub cluster: ClusterConfig,
    /// Snapshot persistence.
    pub snapshots: SnapshotConfig,
}

/// Defaults for `cluster` and `drill`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub default_k: usize,
    pub seed: u64,
    pub algorithm: ClusterAlgorithm,
    pub metric: Metric,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        let params = ClusterParams::default();
        Self {
            default_k: params.k,
            seed: params.seed,
            algorithm: params.algorithm,
            metric: params.metric,
        }
    }
}

/// Where snapshots live and how names are checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub dir: PathBuf,
    pub name_policy: NamePolicy,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("snapshots"),
            name_policy: NamePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Loads a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Parses config from a YAML string. An empty document yields defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Clustering parameters from config, with per-flag overrides.
    pub fn cluster_params(
        &self,
        k: Option<usize>,
        seed: Option<u64>,
        algorithm: Option<ClusterAlgorithm>,
        metric: Option<Metric>,
    ) -> ClusterParams {
        ClusterParams {
            metric: metric.unwrap_or_else(|| self.cluster.metric.clone()),
            algorithm: algorithm.unwrap_or(self.cluster.algorithm),
            k: k.unwrap_or(self.cluster.default_k),
            seed: seed.unwrap_or(self.cluster.seed),
        }
    }
}

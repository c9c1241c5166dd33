//! Cluster hierarchy storage.
//!
//! All runs and assignment records live in one flat arena keyed by id.
//! A record points at its parent by id; `path` and `level` are derived
//! from that chain and can be rebuilt with
//! [`ClusterForest::recompute_lineage`].
//!
//! ```text
//! tree 0   run 0 (top)     "0"     "1"     "2"
//!          run 1 (drill "1")       "1-0"   "1-1"
//!          run 2 (drill "1-0")     "1-0-0" "1-0-1"
//! ```

use crate::{ClusterAlgorithm, ClusterError, ClusterResult, Metric};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Id of one assignment record.
pub type AssignmentId = u64;
/// Id of one clustering run.
pub type RunId = u64;
/// Id of one hierarchy (a top-level run plus its drill-downs).
pub type TreeId = u64;

/// Membership of one LUT in one cluster of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Record id.
    pub id: AssignmentId,
    /// Run that produced the record.
    pub run_id: RunId,
    /// Hierarchy the run belongs to.
    pub tree_id: TreeId,
    /// Clustered LUT.
    pub lut_id: String,
    /// Cluster within the run, `0..k`.
    pub cluster_id: u32,
    /// Record of the same LUT in the parent cluster.
    pub parent: Option<AssignmentId>,
    /// Cluster id of `parent`.
    pub parent_cluster_id: Option<u32>,
    /// Root-to-leaf cluster ids joined by `-`.
    pub path: String,
    /// Number of ancestors.
    pub level: u32,
    /// Euclidean distance to the cluster centroid in metric space.
    pub distance_to_center: f64,
    /// Hidden as redundant by distillation.
    #[serde(default)]
    pub distilled: bool,
}

/// Metadata of one clustering invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRun {
    /// Run id.
    pub run_id: RunId,
    /// Hierarchy the run belongs to.
    pub tree_id: TreeId,
    /// Path of the drilled cluster; `None` for a top-level run.
    pub parent_path: Option<String>,
    /// Projection used for distances.
    pub metric: Metric,
    /// Partitioning algorithm.
    pub algorithm: ClusterAlgorithm,
    /// Requested cluster count.
    pub k: usize,
    /// Initialization seed.
    pub seed: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Metric-space point of every member, keyed by LUT id.
    #[serde(default)]
    pub coordinates: BTreeMap<String, Vec<f64>>,
}

impl ClusterRun {
    /// Level of the records this run produces.
    pub fn level(&self) -> u32 {
        self.parent_path
            .as_deref()
            .map_or(0, |p| p.split('-').count() as u32)
    }
}

/// Arena of runs and assignment records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterForest {
    runs: BTreeMap<RunId, ClusterRun>,
    records: BTreeMap<AssignmentId, ClusterAssignment>,
    next_tree: TreeId,
    next_run: RunId,
    next_record: AssignmentId,
}

impl ClusterForest {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no run has been recorded.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Run by id.
    pub fn run(&self, run_id: RunId) -> Option<&ClusterRun> {
        self.runs.get(&run_id)
    }

    /// All runs in creation order.
    pub fn runs(&self) -> impl Iterator<Item = &ClusterRun> {
        self.runs.values()
    }

    /// Record by id.
    pub fn record(&self, id: AssignmentId) -> Option<&ClusterAssignment> {
        self.records.get(&id)
    }

    /// All records in creation order.
    pub fn records(&self) -> impl Iterator<Item = &ClusterAssignment> {
        self.records.values()
    }

    /// Distinct tree ids.
    pub fn tree_ids(&self) -> Vec<TreeId> {
        let mut ids: Vec<TreeId> = self.runs.values().map(|r| r.tree_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Top-level run of a tree.
    pub fn root_run(&self, tree_id: TreeId) -> Option<&ClusterRun> {
        self.runs
            .values()
            .find(|r| r.tree_id == tree_id && r.parent_path.is_none())
    }

    /// Records of one run, in input order.
    pub fn run_records(&self, run_id: RunId) -> Vec<&ClusterAssignment> {
        self.records.values().filter(|r| r.run_id == run_id).collect()
    }

    /// Records of one run that are not distilled away.
    pub fn visible(&self, run_id: RunId) -> Vec<&ClusterAssignment> {
        self.records
            .values()
            .filter(|r| r.run_id == run_id && !r.distilled)
            .collect()
    }

    /// Members of the cluster at `path` in a tree.
    pub fn records_for_path(&self, tree_id: TreeId, path: &str) -> Vec<&ClusterAssignment> {
        self.records
            .values()
            .filter(|r| r.tree_id == tree_id && r.path == path)
            .collect()
    }

    /// Records whose parent is `id`.
    pub fn children_of(&self, id: AssignmentId) -> Vec<&ClusterAssignment> {
        self.records
            .values()
            .filter(|r| r.parent == Some(id))
            .collect()
    }

    /// Drill-down runs made directly on the cluster at `path`.
    pub fn child_runs(&self, tree_id: TreeId, path: &str) -> Vec<&ClusterRun> {
        self.runs
            .values()
            .filter(|r| r.tree_id == tree_id && r.parent_path.as_deref() == Some(path))
            .collect()
    }

    pub(crate) fn allocate_tree(&mut self) -> TreeId {
        let id = self.next_tree;
        self.next_tree += 1;
        id
    }

    pub(crate) fn allocate_run(&mut self) -> RunId {
        let id = self.next_run;
        self.next_run += 1;
        id
    }

    pub(crate) fn allocate_record(&mut self) -> AssignmentId {
        let id = self.next_record;
        self.next_record += 1;
        id
    }

    pub(crate) fn insert_run(&mut self, run: ClusterRun) {
        self.runs.insert(run.run_id, run);
    }

    pub(crate) fn insert_record(&mut self, record: ClusterAssignment) {
        self.records.insert(record.id, record);
    }

    pub(crate) fn record_mut(&mut self, id: AssignmentId) -> Option<&mut ClusterAssignment> {
        self.records.get_mut(&id)
    }

    /// Removes every run below the cluster at `path` and their records.
    ///
    /// Returns the number of runs removed. Records at `path` itself stay.
    pub(crate) fn remove_subtree(&mut self, tree_id: TreeId, path: &str) -> usize {
        let prefix = format!("{path}-");
        let doomed: Vec<RunId> = self
            .runs
            .values()
            .filter(|r| {
                r.tree_id == tree_id
                    && r.parent_path
                        .as_deref()
                        .is_some_and(|p| p == path || p.starts_with(&prefix))
            })
            .map(|r| r.run_id)
            .collect();
        for id in &doomed {
            self.runs.remove(id);
        }
        self.records.retain(|_, r| !doomed.contains(&r.run_id));
        doomed.len()
    }

    /// Rebuilds `path`, `level` and `parent_cluster_id` from parent links.
    ///
    /// Parents always carry smaller ids than their children, so a single
    /// ascending pass sees every parent before its children.
    pub fn recompute_lineage(&mut self) {
        let mut lineage: HashMap<AssignmentId, (String, u32, u32)> = HashMap::new();
        for record in self.records.values_mut() {
            let parent = record.parent.and_then(|p| lineage.get(&p));
            match (record.parent, parent) {
                (None, _) => {
                    record.path = record.cluster_id.to_string();
                    record.level = 0;
                    record.parent_cluster_id = None;
                }
                (Some(_), Some((path, level, cluster_id))) => {
                    record.path = format!("{path}-{}", record.cluster_id);
                    record.level = level + 1;
                    record.parent_cluster_id = Some(*cluster_id);
                }
                // dangling parent: left for validate_hierarchy to report
                (Some(_), None) => {}
            }
            lineage.insert(record.id, (record.path.clone(), record.level, record.cluster_id));
        }
    }

    /// Checks the parent/path/level invariants of every record.
    ///
    /// # Errors
    ///
    /// [`ClusterError::Hierarchy`] naming the first offending record.
    pub fn validate_hierarchy(&self) -> ClusterResult<()> {
        let fail = |id: AssignmentId, what: &str| {
            Err(ClusterError::Hierarchy(format!("record {id}: {what}")))
        };
        for r in self.records.values() {
            if !self.runs.contains_key(&r.run_id) {
                return fail(r.id, "unknown run");
            }
            match r.parent {
                None => {
                    if r.level != 0 || r.parent_cluster_id.is_some() || r.path != r.cluster_id.to_string() {
                        return fail(r.id, "root record has parent lineage");
                    }
                }
                Some(pid) => {
                    let Some(p) = self.records.get(&pid) else {
                        return fail(r.id, "missing parent");
                    };
                    if p.tree_id != r.tree_id || p.lut_id != r.lut_id {
                        return fail(r.id, "parent belongs to another tree or LUT");
                    }
                    if r.level != p.level + 1 {
                        return fail(r.id, "level is not parent level + 1");
                    }
                    if r.path != format!("{}-{}", p.path, r.cluster_id) {
                        return fail(r.id, "path does not extend parent path");
                    }
                    if r.parent_cluster_id != Some(p.cluster_id) {
                        return fail(r.id, "parent_cluster_id mismatch");
                    }
                }
            }
        }
        Ok(())
    }

    /// Serializes the forest to pretty JSON.
    pub fn to_json(&self) -> ClusterResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a forest.
    pub fn from_json(json: &str) -> ClusterResult<Self> {
        let forest: Self = serde_json::from_str(json)?;
        forest.validate_hierarchy()?;
        Ok(forest)
    }

    /// Writes the forest to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ClusterResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Loads a forest from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ClusterResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

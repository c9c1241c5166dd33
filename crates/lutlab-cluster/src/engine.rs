//! Clustering engine: feature registry, runs, drill-downs, distillation.
//!
//! The engine owns a registry of feature vectors keyed by LUT id and a
//! [`ClusterForest`] of results. Each invocation partitions outside any
//! forest lock and then commits its run and records in one write section,
//! so a failed invocation leaves the forest untouched. Drill-downs on the
//! same parent cluster are serialized by a per-parent mutex.

use crate::forest::{AssignmentId, ClusterAssignment, ClusterForest, ClusterRun, RunId, TreeId};
use crate::metric::euclidean;
use crate::snapshot::ClusterSnapshot;
use crate::{ClusterAlgorithm, ClusterError, ClusterResult, Metric};
use chrono::Utc;
use lutlab_analysis::FeatureVector;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters of one clustering invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Projection of the feature vectors.
    pub metric: Metric,
    /// Partitioning algorithm.
    pub algorithm: ClusterAlgorithm,
    /// Number of clusters.
    pub k: usize,
    /// Initialization seed.
    pub seed: u64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            metric: Metric::all(),
            algorithm: ClusterAlgorithm::default(),
            k: 4,
            seed: 0,
        }
    }
}

impl ClusterParams {
    /// Default parameters with `k` clusters.
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }
}

/// How [`ClusterEngine::distill`] picks redundant members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistillMode {
    /// Per cluster, hide members within `eps` of the centroid, keeping the
    /// member closest to it.
    CenterRadius(f64),
    /// Per cluster, walk members by ascending centroid distance and hide
    /// any member within `eps` of one already kept.
    Pairwise(f64),
}

impl DistillMode {
    fn eps(self) -> f64 {
        match self {
            DistillMode::CenterRadius(eps) | DistillMode::Pairwise(eps) => eps,
        }
    }
}

/// Outcome of a distillation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistillReport {
    /// Run that was distilled.
    pub run_id: RunId,
    /// Members left visible.
    pub kept: usize,
    /// Members flagged as distilled.
    pub flagged: usize,
}

/// Clusters LUT feature vectors into a navigable hierarchy.
#[derive(Debug, Default)]
pub struct ClusterEngine {
    features: RwLock<BTreeMap<String, FeatureVector>>,
    forest: RwLock<ClusterForest>,
    parent_locks: Mutex<HashMap<(TreeId, String), Arc<Mutex<()>>>>,
}

struct Member {
    lut_id: String,
    parent: Option<(AssignmentId, u32, String, u32)>,
}

impl ClusterEngine {
    /// Creates an engine with an empty registry and forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine around an existing forest.
    pub fn with_forest(forest: ClusterForest) -> Self {
        Self {
            forest: RwLock::new(forest),
            ..Self::default()
        }
    }

    // === Feature registry ===

    /// Registers or replaces the features of a LUT.
    ///
    /// Returns the previous vector, if any.
    pub fn upsert_features(&self, lut_id: impl Into<String>, features: FeatureVector) -> Option<FeatureVector> {
        self.features.write().insert(lut_id.into(), features)
    }

    /// Features of a LUT.
    pub fn features(&self, lut_id: &str) -> Option<FeatureVector> {
        self.features.read().get(lut_id).copied()
    }

    /// Registered LUT ids, sorted.
    pub fn lut_ids(&self) -> Vec<String> {
        self.features.read().keys().cloned().collect()
    }

    // === Clustering ===

    /// Runs a top-level clustering, opening a new tree.
    ///
    /// `lut_ids` selects and orders the members; `None` takes every
    /// registered LUT in id order.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::NotFound`] for an unregistered LUT id
    /// - [`ClusterError::InsufficientData`] if there are fewer members than `k`
    /// - [`ClusterError::InvalidArgument`] if `k == 0` or features are not finite
    pub fn cluster(&self, lut_ids: Option<&[String]>, params: &ClusterParams) -> ClusterResult<ClusterRun> {
        let ids = match lut_ids {
            Some(ids) => {
                let mut unique: Vec<String> = Vec::with_capacity(ids.len());
                for id in ids {
                    if !unique.contains(id) {
                        unique.push(id.clone());
                    }
                }
                unique
            }
            None => self.lut_ids(),
        };
        let members = ids
            .into_iter()
            .map(|lut_id| Member { lut_id, parent: None })
            .collect();
        self.run_partition(None, members, params)
    }

    /// Re-clusters the members of the cluster at `parent_path` in a tree.
    ///
    /// A previous drill-down of the same cluster and everything below it
    /// is replaced. Parent records are never modified.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::NotFound`] if the path has no members or the tree
    ///   is unknown
    /// - plus the errors of [`ClusterEngine::cluster`]
    pub fn drill_down(&self, tree_id: TreeId, parent_path: &str, params: &ClusterParams) -> ClusterResult<ClusterRun> {
        let lock = self.parent_lock(tree_id, parent_path);
        let _guard = lock.lock();

        let members = self.drill_members(tree_id, parent_path)?;
        self.run_partition(Some((tree_id, parent_path)), members, params)
    }

    fn drill_members(&self, tree_id: TreeId, parent_path: &str) -> ClusterResult<Vec<Member>> {
        let members: Vec<Member> = self
            .forest
            .read()
            .records_for_path(tree_id, parent_path)
            .into_iter()
            .map(|r| Member {
                lut_id: r.lut_id.clone(),
                parent: Some((r.id, r.cluster_id, r.path.clone(), r.level)),
            })
            .collect();
        if members.is_empty() {
            return Err(ClusterError::NotFound(format!(
                "cluster {parent_path} in tree {tree_id}"
            )));
        }
        Ok(members)
    }

    fn parent_lock(&self, tree_id: TreeId, path: &str) -> Arc<Mutex<()>> {
        let mut locks = self.parent_locks.lock();
        Arc::clone(locks.entry((tree_id, path.to_string())).or_default())
    }

    /// Drops the locks of clusters below `path` once their records are gone.
    /// Locks still held by an in-flight drill-down are kept.
    fn prune_parent_locks(&self, tree_id: TreeId, path: &str) {
        let prefix = format!("{path}-");
        let mut locks = self.parent_locks.lock();
        let before = locks.len();
        locks.retain(|(tree, p), lock| {
            *tree != tree_id || !p.starts_with(&prefix) || Arc::strong_count(lock) > 1
        });
        let pruned = before - locks.len();
        if pruned > 0 {
            debug!(tree_id, path, pruned, "pruned stale drill-down locks");
        }
    }

    fn run_partition(
        &self,
        drill: Option<(TreeId, &str)>,
        members: Vec<Member>,
        params: &ClusterParams,
    ) -> ClusterResult<ClusterRun> {
        let vectors = {
            let registry = self.features.read();
            members
                .iter()
                .map(|m| {
                    registry
                        .get(&m.lut_id)
                        .copied()
                        .ok_or_else(|| ClusterError::NotFound(format!("features of {}", m.lut_id)))
                })
                .collect::<ClusterResult<Vec<_>>>()?
        };
        let points = params.metric.project(&vectors)?;
        let partition = params.algorithm.partition(&points, params.k, params.seed)?;
        debug!(
            members = members.len(),
            k = params.k,
            algorithm = %params.algorithm,
            "partition computed"
        );

        let mut forest = self.forest.write();
        let tree_id = match drill {
            Some((tree_id, path)) => {
                // parents may have been replaced while partitioning
                let still_there = members.iter().all(|m| {
                    m.parent
                        .as_ref()
                        .is_some_and(|(id, ..)| forest.record(*id).is_some())
                });
                if !still_there {
                    return Err(ClusterError::NotFound(format!(
                        "cluster {path} in tree {tree_id} changed during drill-down"
                    )));
                }
                let replaced = forest.remove_subtree(tree_id, path);
                if replaced > 0 {
                    debug!(tree_id, path, runs = replaced, "replaced previous drill-down");
                }
                tree_id
            }
            None => forest.allocate_tree(),
        };

        let run_id = forest.allocate_run();
        let run = ClusterRun {
            run_id,
            tree_id,
            parent_path: drill.map(|(_, p)| p.to_string()),
            metric: params.metric.clone(),
            algorithm: params.algorithm,
            k: params.k,
            seed: params.seed,
            created_at: Utc::now(),
            coordinates: members
                .iter()
                .zip(&points)
                .map(|(m, p)| (m.lut_id.clone(), p.clone()))
                .collect(),
        };

        for (i, member) in members.into_iter().enumerate() {
            let cluster_id = partition.labels[i];
            let (parent, parent_cluster_id, path, level) = match member.parent {
                Some((pid, pcluster, ppath, plevel)) => {
                    (Some(pid), Some(pcluster), format!("{ppath}-{cluster_id}"), plevel + 1)
                }
                None => (None, None, cluster_id.to_string(), 0),
            };
            let id = forest.allocate_record();
            forest.insert_record(ClusterAssignment {
                id,
                run_id,
                tree_id,
                lut_id: member.lut_id,
                cluster_id,
                parent,
                parent_cluster_id,
                path,
                level,
                distance_to_center: partition.distances[i],
                distilled: false,
            });
        }
        forest.insert_run(run.clone());
        drop(forest);

        if let Some((tree_id, path)) = drill {
            self.prune_parent_locks(tree_id, path);
        }

        info!(
            run_id,
            tree_id,
            parent = run.parent_path.as_deref().unwrap_or("-"),
            members = run.coordinates.len(),
            clusters = partition.n_clusters(),
            "clustering run stored"
        );
        Ok(run)
    }

    // === Distillation ===

    /// Flags redundant members of a run.
    ///
    /// Flags from a previous distillation of the run are recomputed.
    /// `cluster_id` and `path` are never touched.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidArgument`] if `eps` is negative or not finite
    /// - [`ClusterError::NotFound`] if the run is unknown
    pub fn distill(&self, run_id: RunId, mode: DistillMode) -> ClusterResult<DistillReport> {
        let eps = mode.eps();
        if !eps.is_finite() || eps < 0.0 {
            return Err(ClusterError::InvalidArgument(format!("eps must be >= 0, got {eps}")));
        }

        let mut forest = self.forest.write();
        let run = forest
            .run(run_id)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(format!("run {run_id}")))?;

        let mut clusters: BTreeMap<u32, Vec<(AssignmentId, f64, String)>> = BTreeMap::new();
        for r in forest.run_records(run_id) {
            clusters
                .entry(r.cluster_id)
                .or_default()
                .push((r.id, r.distance_to_center, r.lut_id.clone()));
        }

        let mut flagged_ids = Vec::new();
        for members in clusters.values_mut() {
            members.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            match mode {
                DistillMode::CenterRadius(eps) => {
                    // members[0] is the one closest to the centroid
                    flagged_ids.extend(members.iter().skip(1).filter(|m| m.1 <= eps).map(|m| m.0));
                }
                DistillMode::Pairwise(eps) => {
                    let mut kept: Vec<&[f64]> = Vec::new();
                    for (id, _, lut_id) in members.iter() {
                        let Some(point) = run.coordinates.get(lut_id) else {
                            continue;
                        };
                        if kept.iter().any(|k| euclidean(k, point) <= eps) {
                            flagged_ids.push(*id);
                        } else {
                            kept.push(point);
                        }
                    }
                }
            }
        }

        let total: usize = clusters.values().map(Vec::len).sum();
        for members in clusters.values() {
            for (id, ..) in members {
                if let Some(r) = forest.record_mut(*id) {
                    r.distilled = flagged_ids.contains(id);
                }
            }
        }

        let report = DistillReport {
            run_id,
            kept: total - flagged_ids.len(),
            flagged: flagged_ids.len(),
        };
        info!(run_id, ?mode, kept = report.kept, flagged = report.flagged, "run distilled");
        Ok(report)
    }

    /// Clears every distillation flag of a run. Returns how many were set.
    pub fn clear_distilled(&self, run_id: RunId) -> ClusterResult<usize> {
        let mut forest = self.forest.write();
        if forest.run(run_id).is_none() {
            return Err(ClusterError::NotFound(format!("run {run_id}")));
        }
        let ids: Vec<AssignmentId> = forest
            .run_records(run_id)
            .into_iter()
            .filter(|r| r.distilled)
            .map(|r| r.id)
            .collect();
        for id in &ids {
            if let Some(r) = forest.record_mut(*id) {
                r.distilled = false;
            }
        }
        Ok(ids.len())
    }

    // === Results ===

    /// Read access to the forest.
    pub fn forest(&self) -> RwLockReadGuard<'_, ClusterForest> {
        self.forest.read()
    }

    /// Builds a snapshot of a run (not yet committed anywhere).
    pub fn snapshot_of(&self, run_id: RunId, name: impl Into<String>) -> ClusterResult<ClusterSnapshot> {
        let forest = self.forest.read();
        let run = forest
            .run(run_id)
            .ok_or_else(|| ClusterError::NotFound(format!("run {run_id}")))?;
        Ok(ClusterSnapshot::from_run(name, run, forest.run_records(run_id)))
    }

    /// Serializes the forest to JSON.
    pub fn export_json(&self) -> ClusterResult<String> {
        self.forest.read().to_json()
    }

    /// Replaces the forest with a validated JSON export.
    pub fn import_json(&self, json: &str) -> ClusterResult<()> {
        let forest = ClusterForest::from_json(json)?;
        *self.forest.write() = forest;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agglomerative::Linkage;
    use lutlab_analysis::FeatureDim;

    fn fv(h: f64, s: f64, c: f64) -> FeatureVector {
        FeatureVector {
            h_mean: h,
            s_mean: s,
            s_var: 0.01,
            v_var: 0.02,
            contrast_rgb: c,
        }
    }

    /// Two hue families, each with two saturation sub-groups.
    fn engine() -> ClusterEngine {
        let e = ClusterEngine::new();
        let data = [
            ("warm-a1", 10.0, 0.20),
            ("warm-a2", 11.0, 0.21),
            ("warm-b1", 12.0, 0.80),
            ("warm-b2", 10.5, 0.82),
            ("cool-a1", 200.0, 0.20),
            ("cool-a2", 201.0, 0.22),
            ("cool-b1", 202.0, 0.85),
            ("cool-b2", 199.0, 0.86),
        ];
        for (id, h, s) in data {
            e.upsert_features(id, fv(h, s, 0.9));
        }
        e
    }

    fn hue_params(k: usize) -> ClusterParams {
        ClusterParams {
            metric: Metric::new([FeatureDim::HMean]).unwrap(),
            k,
            seed: 11,
            ..ClusterParams::default()
        }
    }

    fn sat_params(k: usize) -> ClusterParams {
        ClusterParams {
            metric: Metric::new([FeatureDim::SMean]).unwrap(),
            k,
            seed: 11,
            ..ClusterParams::default()
        }
    }

    #[test]
    fn top_level_run() {
        let e = engine();
        let run = e.cluster(None, &hue_params(2)).unwrap();
        let forest = e.forest();
        let records = forest.run_records(run.run_id);
        assert_eq!(records.len(), 8);
        // ids sorted: cool-* first, so cool is cluster 0
        for r in &records {
            let expected = if r.lut_id.starts_with("cool") { 0 } else { 1 };
            assert_eq!(r.cluster_id, expected, "{}", r.lut_id);
            assert_eq!(r.path, expected.to_string());
            assert_eq!(r.level, 0);
            assert!(r.parent.is_none());
        }
        assert!(forest.validate_hierarchy().is_ok());
    }

    #[test]
    fn explicit_member_order_drives_labels() {
        let e = engine();
        let ids: Vec<String> = ["warm-a1", "cool-a1", "warm-b1", "cool-b1"].map(String::from).to_vec();
        let run = e.cluster(Some(&ids), &hue_params(2)).unwrap();
        let forest = e.forest();
        let labels: Vec<u32> = forest.run_records(run.run_id).iter().map(|r| r.cluster_id).collect();
        assert_eq!(labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn reproducible_runs() {
        let e = engine();
        let a = e.cluster(None, &hue_params(3)).unwrap();
        let b = e.cluster(None, &hue_params(3)).unwrap();
        let forest = e.forest();
        let la: Vec<(String, u32)> = forest
            .run_records(a.run_id)
            .iter()
            .map(|r| (r.lut_id.clone(), r.cluster_id))
            .collect();
        let lb: Vec<(String, u32)> = forest
            .run_records(b.run_id)
            .iter()
            .map(|r| (r.lut_id.clone(), r.cluster_id))
            .collect();
        assert_eq!(la, lb);
        assert_ne!(a.tree_id, b.tree_id);
    }

    #[test]
    fn drill_down_builds_hierarchy() {
        let e = engine();
        let top = e.cluster(None, &hue_params(2)).unwrap();
        let child = e.drill_down(top.tree_id, "1", &sat_params(2)).unwrap();
        assert_eq!(child.parent_path.as_deref(), Some("1"));

        let forest = e.forest();
        let records = forest.run_records(child.run_id);
        assert_eq!(records.len(), 4);
        for r in &records {
            assert!(r.lut_id.starts_with("warm"));
            let parent = forest.record(r.parent.unwrap()).unwrap();
            assert_eq!(parent.run_id, top.run_id);
            assert_eq!(r.level, parent.level + 1);
            assert_eq!(r.path, format!("{}-{}", parent.path, r.cluster_id));
            assert_eq!(r.parent_cluster_id, Some(1));
        }
        // warm-a1 comes first among the warm ids
        assert_eq!(forest.records_for_path(top.tree_id, "1-0").len(), 2);
        assert!(forest.records_for_path(top.tree_id, "1-0").iter().all(|r| r.lut_id.starts_with("warm-a")));
        forest.validate_hierarchy().unwrap();
    }

    #[test]
    fn repeated_drill_down_replaces_subtree() {
        let e = engine();
        let top = e.cluster(None, &hue_params(2)).unwrap();
        let first = e.drill_down(top.tree_id, "0", &sat_params(2)).unwrap();
        let nested = e.drill_down(top.tree_id, "0-1", &ClusterParams::with_k(1)).unwrap();
        assert_eq!(nested.parent_path.as_deref(), Some("0-1"));

        let second = e.drill_down(top.tree_id, "0", &sat_params(2)).unwrap();
        let forest = e.forest();
        assert!(forest.run(first.run_id).is_none());
        assert!(forest.run(nested.run_id).is_none());
        assert_eq!(forest.child_runs(top.tree_id, "0").len(), 1);
        assert_eq!(forest.run_records(second.run_id).len(), 4);
        assert_eq!(forest.run_records(top.run_id).len(), 8);
        forest.validate_hierarchy().unwrap();
    }

    #[test]
    fn replacing_a_drill_down_prunes_descendant_locks() {
        let e = engine();
        let top = e.cluster(None, &hue_params(2)).unwrap();
        e.drill_down(top.tree_id, "0", &sat_params(2)).unwrap();
        e.drill_down(top.tree_id, "0-0", &ClusterParams::with_k(1)).unwrap();
        e.drill_down(top.tree_id, "0-1", &ClusterParams::with_k(1)).unwrap();
        e.drill_down(top.tree_id, "1", &sat_params(2)).unwrap();
        assert_eq!(e.parent_locks.lock().len(), 4);

        e.drill_down(top.tree_id, "0", &sat_params(2)).unwrap();
        let mut paths: Vec<String> = e.parent_locks.lock().keys().map(|(_, p)| p.clone()).collect();
        paths.sort();
        assert_eq!(paths, vec!["0", "1"]);
    }

    #[test]
    fn stale_parents_are_rejected() {
        let e = engine();
        let top = e.cluster(None, &hue_params(2)).unwrap();
        e.drill_down(top.tree_id, "0", &sat_params(2)).unwrap();
        let stale = e.drill_members(top.tree_id, "0-0").unwrap();
        assert_eq!(stale.len(), 2);

        // replacing "0" removes the records the stale members point at
        e.drill_down(top.tree_id, "0", &sat_params(2)).unwrap();
        let runs_before = e.forest().runs().count();
        let err = e
            .run_partition(Some((top.tree_id, "0-0")), stale, &ClusterParams::with_k(1))
            .unwrap_err();
        match err {
            ClusterError::NotFound(msg) => assert!(msg.contains("changed during drill-down"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(e.forest().runs().count(), runs_before);
        e.forest().validate_hierarchy().unwrap();
    }

    #[test]
    fn drill_down_errors() {
        let e = engine();
        let top = e.cluster(None, &hue_params(2)).unwrap();
        assert!(matches!(
            e.drill_down(top.tree_id, "7", &sat_params(2)),
            Err(ClusterError::NotFound(_))
        ));
        assert!(matches!(
            e.drill_down(top.tree_id, "0", &sat_params(5)),
            Err(ClusterError::InsufficientData { members: 4, k: 5 })
        ));
        // the failed drill-down left nothing behind
        assert_eq!(e.forest().runs().count(), 1);
    }

    #[test]
    fn cluster_errors() {
        let e = engine();
        assert!(matches!(
            e.cluster(None, &hue_params(0)),
            Err(ClusterError::InvalidArgument(_))
        ));
        assert!(matches!(
            e.cluster(None, &hue_params(9)),
            Err(ClusterError::InsufficientData { members: 8, k: 9 })
        ));
        let ids = vec!["warm-a1".to_string(), "missing".to_string()];
        assert!(matches!(
            e.cluster(Some(&ids), &hue_params(1)),
            Err(ClusterError::NotFound(_))
        ));
        assert!(e.forest().is_empty());
    }

    #[test]
    fn distill_center_radius() {
        let e = engine();
        let run = e.cluster(None, &hue_params(2)).unwrap();
        let before: Vec<(u32, String)> = e
            .forest()
            .run_records(run.run_id)
            .iter()
            .map(|r| (r.cluster_id, r.path.clone()))
            .collect();

        let report = e.distill(run.run_id, DistillMode::CenterRadius(100.0)).unwrap();
        assert_eq!(report, DistillReport { run_id: run.run_id, kept: 2, flagged: 6 });

        let forest = e.forest();
        let after: Vec<(u32, String)> = forest
            .run_records(run.run_id)
            .iter()
            .map(|r| (r.cluster_id, r.path.clone()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(forest.visible(run.run_id).len(), 2);
    }

    #[test]
    fn distill_pairwise_and_clear() {
        let e = engine();
        let run = e.cluster(None, &sat_params(2)).unwrap();
        // saturation groups are 0.2-0.22 and 0.8-0.86
        let report = e.distill(run.run_id, DistillMode::Pairwise(0.03)).unwrap();
        assert_eq!(report.flagged + report.kept, 8);
        assert!(report.kept >= 2);
        assert!(report.kept < 8);

        assert_eq!(e.clear_distilled(run.run_id).unwrap(), report.flagged);
        assert_eq!(e.forest().visible(run.run_id).len(), 8);

        assert!(matches!(
            e.distill(run.run_id, DistillMode::Pairwise(-1.0)),
            Err(ClusterError::InvalidArgument(_))
        ));
        assert!(matches!(e.distill(999, DistillMode::Pairwise(0.1)), Err(ClusterError::NotFound(_))));
    }

    #[test]
    fn zero_radius_keeps_everything_distinct() {
        let e = engine();
        let run = e.cluster(None, &hue_params(2)).unwrap();
        let report = e.distill(run.run_id, DistillMode::Pairwise(0.0)).unwrap();
        assert_eq!(report.flagged, 0);
    }

    #[test]
    fn snapshot_and_export() {
        let e = engine();
        let params = ClusterParams {
            algorithm: ClusterAlgorithm::Agglomerative { linkage: Linkage::Complete },
            ..hue_params(2)
        };
        let run = e.cluster(None, &params).unwrap();
        let snap = e.snapshot_of(run.run_id, "families").unwrap();
        assert_eq!(snap.n_clusters, 2);
        assert_eq!(snap.membership[&0].len(), 4);
        assert_eq!(snap.algorithm, params.algorithm);

        let json = e.export_json().unwrap();
        let other = ClusterEngine::new();
        other.import_json(&json).unwrap();
        assert_eq!(*other.forest(), *e.forest());
    }

    #[test]
    fn upsert_overwrites() {
        let e = engine();
        let old = e.upsert_features("warm-a1", fv(300.0, 0.5, 0.5));
        assert_eq!(old.map(|f| f.h_mean), Some(10.0));
        assert_eq!(e.features("warm-a1").map(|f| f.h_mean), Some(300.0));
        assert_eq!(e.lut_ids().len(), 8);
    }

    #[test]
    fn concurrent_drill_downs_on_same_parent() {
        let e = Arc::new(engine());
        let top = e.cluster(None, &hue_params(2)).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let e = Arc::clone(&e);
                std::thread::spawn(move || e.drill_down(top.tree_id, "1", &sat_params(2)).map(|r| r.run_id))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        let forest = e.forest();
        assert_eq!(forest.child_runs(top.tree_id, "1").len(), 1);
        forest.validate_hierarchy().unwrap();
    }
}

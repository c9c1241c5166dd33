//! Persisted cluster snapshots.
//!
//! A [`ClusterSnapshot`] freezes the membership of one run so it can be
//! reloaded after the in-memory forest is gone. Snapshots are never
//! modified; re-running and snapshotting again creates a new record with a
//! new id.

use crate::forest::{ClusterAssignment, ClusterRun, TreeId};
use crate::store::{JsonDirStore, Keyed, MemoryStore, Store};
use crate::{ClusterAlgorithm, ClusterError, ClusterResult, Metric};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Immutable record of one run's cluster membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Random v4 id.
    pub id: Uuid,
    /// Caller-chosen label.
    pub name: String,
    /// Metric of the run.
    pub metric: Metric,
    /// Algorithm of the run.
    pub algorithm: ClusterAlgorithm,
    /// Number of non-empty clusters.
    pub n_clusters: usize,
    /// LUT ids per cluster id, in run input order.
    pub membership: BTreeMap<u32, Vec<String>>,
    /// Tree the run belongs to.
    pub tree_id: TreeId,
    /// Drilled cluster path, `None` for a top-level run.
    #[serde(default)]
    pub parent_path: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ClusterSnapshot {
    /// Builds a snapshot of `run` from its records.
    pub fn from_run<'a>(
        name: impl Into<String>,
        run: &ClusterRun,
        records: impl IntoIterator<Item = &'a ClusterAssignment>,
    ) -> Self {
        let mut membership: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for r in records.into_iter().filter(|r| r.run_id == run.run_id) {
            membership.entry(r.cluster_id).or_default().push(r.lut_id.clone());
        }
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            metric: run.metric.clone(),
            algorithm: run.algorithm,
            n_clusters: membership.len(),
            membership,
            tree_id: run.tree_id,
            parent_path: run.parent_path.clone(),
            created_at: Utc::now(),
        }
    }

    /// Cluster id holding `lut_id`.
    pub fn cluster_of(&self, lut_id: &str) -> Option<u32> {
        self.membership
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == lut_id))
            .map(|(&c, _)| c)
    }
}

impl Keyed for ClusterSnapshot {
    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Whether snapshot names must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    /// Names are labels only; ids distinguish snapshots.
    #[default]
    AllowDuplicates,
    /// A commit reusing an existing name fails.
    Unique,
}

/// Commits and queries snapshots through a [`Store`].
pub struct SnapshotStore {
    store: Box<dyn Store<ClusterSnapshot>>,
    policy: NamePolicy,
    // serializes the name check with the write under NamePolicy::Unique
    commit_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Wraps an arbitrary backend.
    pub fn new(store: Box<dyn Store<ClusterSnapshot>>, policy: NamePolicy) -> Self {
        Self {
            store,
            policy,
            commit_lock: Mutex::new(()),
        }
    }

    /// In-memory snapshot store.
    pub fn in_memory(policy: NamePolicy) -> Self {
        Self::new(Box::new(MemoryStore::<ClusterSnapshot>::new()), policy)
    }

    /// Snapshot store backed by a directory of JSON files.
    pub fn open_dir<P: AsRef<Path>>(dir: P, policy: NamePolicy) -> ClusterResult<Self> {
        Ok(Self::new(Box::new(JsonDirStore::<ClusterSnapshot>::open(dir)?), policy))
    }

    /// Active name policy.
    pub fn policy(&self) -> NamePolicy {
        self.policy
    }

    /// Persists a snapshot.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::DuplicateName`] under [`NamePolicy::Unique`] when
    ///   the name is taken
    /// - [`ClusterError::Storage`] if the id already exists
    pub fn commit(&self, snapshot: &ClusterSnapshot) -> ClusterResult<Uuid> {
        let _guard = self.commit_lock.lock();
        if self.policy == NamePolicy::Unique && !self.find_by_name(&snapshot.name)?.is_empty() {
            return Err(ClusterError::DuplicateName(snapshot.name.clone()));
        }
        self.store.put_new(snapshot)?;
        info!(
            id = %snapshot.id,
            name = %snapshot.name,
            clusters = snapshot.n_clusters,
            "snapshot committed"
        );
        Ok(snapshot.id)
    }

    /// Snapshot by id.
    pub fn get(&self, id: Uuid) -> ClusterResult<Option<ClusterSnapshot>> {
        self.store.get(&id.to_string())
    }

    /// All snapshots, oldest first.
    pub fn list(&self) -> ClusterResult<Vec<ClusterSnapshot>> {
        let mut all = self.store.list(&|_| true)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    /// Snapshots with exactly this name, oldest first.
    pub fn find_by_name(&self, name: &str) -> ClusterResult<Vec<ClusterSnapshot>> {
        let mut found = self.store.list(&|s| s.name == name)?;
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }
}

//! Agglomerative (bottom-up hierarchical) clustering.
//!
//! Starts with every point in its own cluster and repeatedly merges the
//! closest pair until `n_clusters` remain. Inter-cluster distances are
//! maintained with the Lance-Williams update, so each merge is O(n).
//! The procedure is fully deterministic: ties merge the first pair in
//! row-major scan order.

use crate::metric::euclidean;
use crate::{ClusterError, ClusterResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inter-cluster distance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Minimum pairwise distance.
    Single,
    /// Maximum pairwise distance.
    Complete,
    /// Mean pairwise distance (UPGMA).
    #[default]
    Average,
}

impl Linkage {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
        }
    }

    /// Distance from the merge of `a` and `b` to a third cluster.
    fn update(self, d_a: f64, d_b: f64, n_a: usize, n_b: usize) -> f64 {
        match self {
            Linkage::Single => d_a.min(d_b),
            Linkage::Complete => d_a.max(d_b),
            Linkage::Average => (n_a as f64 * d_a + n_b as f64 * d_b) / (n_a + n_b) as f64,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Agglomerative clustering configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agglomerative {
    n_clusters: usize,
    linkage: Linkage,
}

impl Agglomerative {
    /// Creates a configuration producing `n_clusters` clusters.
    pub fn new(n_clusters: usize, linkage: Linkage) -> Self {
        Self { n_clusters, linkage }
    }

    /// Linkage rule in use.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Clusters `points` and returns one label per point.
    ///
    /// Labels are `0..n_clusters`, ordered by the smallest point index in
    /// each cluster.
    pub fn fit(&self, points: &[Vec<f64>]) -> ClusterResult<Vec<usize>> {
        let n = points.len();
        if self.n_clusters == 0 {
            return Err(ClusterError::InvalidArgument("k must be > 0".into()));
        }
        if n < self.n_clusters {
            return Err(ClusterError::InsufficientData {
                members: n,
                k: self.n_clusters,
            });
        }

        let mut dist = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean(&points[i], &points[j]);
                dist[i][j] = d;
                dist[j][i] = d;
            }
        }

        // owner[p] = cluster slot currently holding point p
        let mut owner: Vec<usize> = (0..n).collect();
        let mut sizes = vec![1usize; n];
        let mut active = vec![true; n];
        let mut remaining = n;

        while remaining > self.n_clusters {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in (0..n).filter(|&i| active[i]) {
                for j in ((i + 1)..n).filter(|&j| active[j]) {
                    if best.is_none_or(|(_, _, d)| dist[i][j] < d) {
                        best = Some((i, j, dist[i][j]));
                    }
                }
            }
            let Some((a, b, _)) = best else { break };

            for m in (0..n).filter(|&m| active[m] && m != a && m != b) {
                let d = self.linkage.update(dist[a][m], dist[b][m], sizes[a], sizes[b]);
                dist[a][m] = d;
                dist[m][a] = d;
            }
            sizes[a] += sizes[b];
            active[b] = false;
            for o in owner.iter_mut().filter(|o| **o == b) {
                *o = a;
            }
            remaining -= 1;
        }

        // Surviving slots are the lowest point index of their cluster.
        let mut slot_label = vec![usize::MAX; n];
        for (label, slot) in (0..n).filter(|&i| active[i]).enumerate() {
            slot_label[slot] = label;
        }
        Ok(owner.into_iter().map(|slot| slot_label[slot]).collect())
    }
}

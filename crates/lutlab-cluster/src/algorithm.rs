//! Clustering algorithm selector.

use crate::agglomerative::{Agglomerative, Linkage};
use crate::kmeans::KMeans;
use crate::metric::euclidean;
use crate::{ClusterError, ClusterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Partitioning algorithm used by a clustering run.
///
/// # Example
///
/// ```rust
/// use lutlab_cluster::ClusterAlgorithm;
///
/// let algo: ClusterAlgorithm = "agglomerative-complete".parse().unwrap();
/// let part = algo.partition(&[vec![0.0], vec![0.1], vec![5.0]], 2, 0).unwrap();
/// assert_eq!(part.labels, vec![0, 0, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    /// Lloyd's K-Means with seeded k-means++ initialization.
    #[serde(rename = "kmeans")]
    KMeans {
        /// Iteration cap.
        max_iter: usize,
        /// Centroid shift tolerance.
        tol: f64,
    },
    /// Bottom-up merging; the seed is ignored.
    Agglomerative {
        /// Inter-cluster distance rule.
        linkage: Linkage,
    },
}

impl Default for ClusterAlgorithm {
    fn default() -> Self {
        ClusterAlgorithm::KMeans {
            max_iter: KMeans::DEFAULT_MAX_ITER,
            tol: KMeans::DEFAULT_TOL,
        }
    }
}

/// Output of [`ClusterAlgorithm::partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Cluster id per input point, numbered by first appearance.
    pub labels: Vec<u32>,
    /// Mean of each cluster's members, indexed by cluster id.
    pub centroids: Vec<Vec<f64>>,
    /// Euclidean distance of each point to its centroid.
    pub distances: Vec<f64>,
}

impl Partition {
    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Builds a partition from raw labels, renumbering them canonically.
    fn from_labels(points: &[Vec<f64>], raw: &[usize]) -> Self {
        let mut remap: Vec<(usize, u32)> = Vec::new();
        let labels: Vec<u32> = raw
            .iter()
            .map(|&r| match remap.iter().find(|(k, _)| *k == r) {
                Some(&(_, id)) => id,
                None => {
                    let id = remap.len() as u32;
                    remap.push((r, id));
                    id
                }
            })
            .collect();

        let k = remap.len();
        let dims = points.first().map_or(0, Vec::len);
        let mut centroids = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in points.iter().zip(&labels) {
            counts[l as usize] += 1;
            for (c, v) in centroids[l as usize].iter_mut().zip(p) {
                *c += v;
            }
        }
        for (c, &n) in centroids.iter_mut().zip(&counts) {
            for v in c.iter_mut() {
                *v /= n as f64;
            }
        }

        let distances = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| euclidean(p, &centroids[l as usize]))
            .collect();

        Self {
            labels,
            centroids,
            distances,
        }
    }
}

impl ClusterAlgorithm {
    /// Partitions `points` into `k` clusters.
    ///
    /// Identical points, `k` and `seed` always produce an identical
    /// partition. Coincident points can leave K-Means with fewer than `k`
    /// non-empty clusters; that is logged and returned as is.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidArgument`] if `k == 0`
    /// - [`ClusterError::InsufficientData`] if `points.len() < k`
    pub fn partition(&self, points: &[Vec<f64>], k: usize, seed: u64) -> ClusterResult<Partition> {
        if k == 0 {
            return Err(ClusterError::InvalidArgument("k must be > 0".into()));
        }
        if points.len() < k {
            return Err(ClusterError::InsufficientData {
                members: points.len(),
                k,
            });
        }
        let raw = match *self {
            ClusterAlgorithm::KMeans { max_iter, tol } => {
                KMeans::new(k)
                    .with_max_iter(max_iter)
                    .with_tol(tol)
                    .with_seed(seed)
                    .fit(points)?
                    .labels
            }
            ClusterAlgorithm::Agglomerative { linkage } => {
                Agglomerative::new(k, linkage).fit(points)?
            }
        };
        let partition = Partition::from_labels(points, &raw);
        if partition.n_clusters() < k {
            warn!(
                requested = k,
                found = partition.n_clusters(),
                algorithm = %self,
                "fewer clusters than requested"
            );
        }
        Ok(partition)
    }
}

impl fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterAlgorithm::KMeans { .. } => f.write_str("kmeans"),
            ClusterAlgorithm::Agglomerative { linkage } => write!(f, "agglomerative-{linkage}"),
        }
    }
}

impl FromStr for ClusterAlgorithm {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let linkage = |l: Linkage| Ok(ClusterAlgorithm::Agglomerative { linkage: l });
        match s.as_str() {
            "kmeans" | "k-means" => Ok(ClusterAlgorithm::default()),
            "agglomerative" | "hierarchical" => linkage(Linkage::default()),
            "agglomerative-single" => linkage(Linkage::Single),
            "agglomerative-complete" => linkage(Linkage::Complete),
            "agglomerative-average" => linkage(Linkage::Average),
            _ => Err(ClusterError::InvalidArgument(format!("unknown algorithm: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points() -> Vec<Vec<f64>> {
        vec![
            vec![9.0, 9.0],
            vec![0.0, 0.0],
            vec![9.2, 9.1],
            vec![0.2, 0.0],
            vec![4.0, 4.5],
        ]
    }

    #[test]
    fn labels_follow_first_appearance() {
        for algo in [
            ClusterAlgorithm::default(),
            ClusterAlgorithm::Agglomerative { linkage: Linkage::Average },
        ] {
            for seed in [0, 1, 99] {
                let part = algo.partition(&points(), 3, seed).unwrap();
                assert_eq!(part.labels[0], 0, "{algo}");
                assert_eq!(part.labels, vec![0, 1, 0, 1, 2], "{algo}");
            }
        }
    }

    #[test]
    fn centroids_and_distances() {
        let part = ClusterAlgorithm::default().partition(&points(), 3, 5).unwrap();
        assert_eq!(part.n_clusters(), 3);
        assert_relative_eq!(part.centroids[1][0], 0.1);
        assert_relative_eq!(part.distances[1], 0.1);
        assert_relative_eq!(part.distances[4], 0.0);
    }

    #[test]
    fn seeded_runs_reproduce() {
        let pts: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i * 37 % 11) as f64, (i * 13 % 7) as f64])
            .collect();
        let a = ClusterAlgorithm::default().partition(&pts, 4, 1234).unwrap();
        let b = ClusterAlgorithm::default().partition(&pts, 4, 1234).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn coincident_points_yield_fewer_clusters() {
        let pts = vec![vec![0.5, 0.5]; 4];
        let part = ClusterAlgorithm::default().partition(&pts, 3, 7).unwrap();
        assert_eq!(part.n_clusters(), 1);
        assert_eq!(part.labels, vec![0; 4]);
        assert!(part.distances.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn argument_errors() {
        let algo = ClusterAlgorithm::default();
        assert!(matches!(
            algo.partition(&points(), 0, 0),
            Err(ClusterError::InvalidArgument(_))
        ));
        assert!(matches!(
            algo.partition(&points(), 6, 0),
            Err(ClusterError::InsufficientData { members: 5, k: 6 })
        ));
    }

    #[test]
    fn parse_names() {
        assert_eq!("kmeans".parse::<ClusterAlgorithm>().unwrap(), ClusterAlgorithm::default());
        assert_eq!(
            "Hierarchical".parse::<ClusterAlgorithm>().unwrap(),
            ClusterAlgorithm::Agglomerative { linkage: Linkage::Average }
        );
        assert_eq!(
            "agglomerative-single".parse::<ClusterAlgorithm>().unwrap().to_string(),
            "agglomerative-single"
        );
        assert!("dbscan".parse::<ClusterAlgorithm>().is_err());
    }

    #[test]
    fn serde_tagged() {
        let json = serde_json::to_string(&ClusterAlgorithm::Agglomerative {
            linkage: Linkage::Complete,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"agglomerative","linkage":"complete"}"#);
        let back: ClusterAlgorithm = serde_json::from_str(r#"{"kind":"kmeans","max_iter":10,"tol":0.5}"#).unwrap();
        assert_eq!(back, ClusterAlgorithm::KMeans { max_iter: 10, tol: 0.5 });
    }
}

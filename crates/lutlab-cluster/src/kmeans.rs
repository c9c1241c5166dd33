//! K-Means clustering.
//!
//! Lloyd's algorithm with seeded k-means++ initialization. The random
//! stream comes from `ChaCha8Rng`, so the same points, `k` and seed give
//! the same labels on every platform.

use crate::metric::squared_euclidean;
use crate::{ClusterError, ClusterResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// K-Means clustering configuration.
///
/// # Algorithm
///
/// 1. Initialize centroids using k-means++ (D^2 sampling)
/// 2. Assign each point to the nearest centroid
/// 3. Update centroids as the mean of assigned points
/// 4. Repeat until no centroid moves more than `tol` or `max_iter` is hit
///
/// # Examples
///
/// ```
/// use lutlab_cluster::kmeans::KMeans;
///
/// let points = vec![
///     vec![1.0, 2.0], vec![1.5, 1.8], vec![1.0, 0.6],
///     vec![8.0, 8.0], vec![9.0, 11.0], vec![8.5, 9.0],
/// ];
/// let fit = KMeans::new(2).with_seed(7).fit(&points).unwrap();
/// assert_eq!(fit.labels[0], fit.labels[1]);
/// assert_ne!(fit.labels[0], fit.labels[3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    n_clusters: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
}

/// Result of a K-Means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster index per point.
    pub labels: Vec<usize>,
    /// Final centroids, `n_clusters` rows.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to assigned centroids.
    pub inertia: f64,
    /// Iterations run.
    pub n_iter: usize,
}

impl KMeans {
    /// Default maximum iterations.
    pub const DEFAULT_MAX_ITER: usize = 300;
    /// Default convergence tolerance.
    pub const DEFAULT_TOL: f64 = 1e-6;

    /// Creates a K-Means configuration for `n_clusters` clusters.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: Self::DEFAULT_MAX_ITER,
            tol: Self::DEFAULT_TOL,
            seed: 0,
        }
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the initialization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fits the model.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidArgument`] if `n_clusters` is zero
    /// - [`ClusterError::InsufficientData`] if there are fewer points than clusters
    pub fn fit(&self, points: &[Vec<f64>]) -> ClusterResult<KMeansFit> {
        if self.n_clusters == 0 {
            return Err(ClusterError::InvalidArgument("k must be > 0".into()));
        }
        if points.len() < self.n_clusters {
            return Err(ClusterError::InsufficientData {
                members: points.len(),
                k: self.n_clusters,
            });
        }

        let mut centroids = self.kmeans_plusplus_init(points);
        let mut labels = assign_labels(points, &centroids);
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            let new_centroids = update_centroids(points, &labels, &centroids);
            let converged = self.centroids_converged(&centroids, &new_centroids);
            centroids = new_centroids;
            labels = assign_labels(points, &centroids);
            n_iter = iter + 1;
            if converged {
                break;
            }
        }

        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_euclidean(p, &centroids[l]))
            .sum();

        Ok(KMeansFit {
            labels,
            centroids,
            inertia,
            n_iter,
        })
    }

    /// Picks initial centroids by D^2 sampling.
    fn kmeans_plusplus_init(&self, points: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n = points.len();
        let mut chosen = Vec::with_capacity(self.n_clusters);
        chosen.push(rng.gen_range(0..n));

        let mut min_dist: Vec<f64> = points
            .iter()
            .map(|p| squared_euclidean(p, &points[chosen[0]]))
            .collect();

        while chosen.len() < self.n_clusters {
            let total: f64 = min_dist.iter().sum();
            let next = if total > 0.0 {
                let target = rng.r#gen::<f64>() * total;
                let mut acc = 0.0;
                let mut pick = None;
                for (i, &d) in min_dist.iter().enumerate() {
                    if d <= 0.0 {
                        continue;
                    }
                    acc += d;
                    pick = Some(i);
                    if acc > target {
                        break;
                    }
                }
                // total > 0 guarantees at least one positive weight
                pick.unwrap_or(0)
            } else {
                // All remaining points coincide with a centroid.
                let free: Vec<usize> = (0..n).filter(|i| !chosen.contains(i)).collect();
                free[rng.gen_range(0..free.len())]
            };
            chosen.push(next);
            for (d, p) in min_dist.iter_mut().zip(points) {
                *d = d.min(squared_euclidean(p, &points[next]));
            }
        }

        chosen.into_iter().map(|i| points[i].clone()).collect()
    }

    /// Checks if centroids have converged.
    fn centroids_converged(&self, old: &[Vec<f64>], new: &[Vec<f64>]) -> bool {
        old.iter()
            .zip(new)
            .all(|(a, b)| squared_euclidean(a, b) <= self.tol * self.tol)
    }
}

/// Assigns each point to the nearest centroid; ties go to the lower index.
fn assign_labels(points: &[Vec<f64>], centroids: &[Vec<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (k, c) in centroids.iter().enumerate() {
                let d = squared_euclidean(p, c);
                if d < best_dist {
                    best_dist = d;
                    best = k;
                }
            }
            best
        })
        .collect()
}

/// Mean of assigned points; an empty cluster keeps its previous centroid.
fn update_centroids(points: &[Vec<f64>], labels: &[usize], old: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dims = old.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dims]; old.len()];
    let mut counts = vec![0usize; old.len()];
    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(p) {
            *s += v;
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(old)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> Vec<Vec<f64>> {
        // Two well-separated clusters
        vec![
            vec![1.0, 2.0],
            vec![1.5, 1.8],
            vec![1.0, 0.6],
            vec![8.0, 8.0],
            vec![9.0, 11.0],
            vec![8.5, 9.0],
        ]
    }

    #[test]
    fn test_labels_consistency() {
        for seed in 0..10 {
            let fit = KMeans::new(2).with_seed(seed).fit(&sample_data()).unwrap();
            assert_eq!(fit.labels[0], fit.labels[1]);
            assert_eq!(fit.labels[1], fit.labels[2]);
            assert_eq!(fit.labels[3], fit.labels[4]);
            assert_eq!(fit.labels[4], fit.labels[5]);
            assert_ne!(fit.labels[0], fit.labels[3]);
        }
    }

    #[test]
    fn test_reproducibility() {
        let a = KMeans::new(3).with_seed(42).fit(&sample_data()).unwrap();
        let b = KMeans::new(3).with_seed(42).fit(&sample_data()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_clusters_error() {
        let err = KMeans::new(7).fit(&sample_data()).unwrap_err();
        assert!(matches!(err, ClusterError::InsufficientData { members: 6, k: 7 }));
    }

    #[test]
    fn test_zero_clusters_error() {
        assert!(matches!(
            KMeans::new(0).fit(&sample_data()),
            Err(ClusterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_single_cluster() {
        let fit = KMeans::new(1).fit(&sample_data()).unwrap();
        assert!(fit.labels.iter().all(|&l| l == 0));
        assert!((fit.centroids[0][0] - 29.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_k_samples() {
        let points = vec![vec![0.0], vec![5.0], vec![10.0]];
        let fit = KMeans::new(3).with_seed(3).fit(&points).unwrap();
        let mut labels = fit.labels.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_identical_points() {
        let points = vec![vec![1.0, 1.0]; 4];
        let fit = KMeans::new(2).with_seed(9).fit(&points).unwrap();
        assert_eq!(fit.labels.len(), 4);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_inertia_decreases_with_more_clusters() {
        let one = KMeans::new(1).with_seed(42).fit(&sample_data()).unwrap();
        let two = KMeans::new(2).with_seed(42).fit(&sample_data()).unwrap();
        assert!(two.inertia < one.inertia);
    }

    #[test]
    fn test_max_iter_limit() {
        let fit = KMeans::new(2).with_max_iter(1).fit(&sample_data()).unwrap();
        assert_eq!(fit.n_iter, 1);
    }
}

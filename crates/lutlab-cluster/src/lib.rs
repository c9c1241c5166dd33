//! # lutlab-cluster
//!
//! Groups LUTs by their feature vectors into a hierarchy that can be
//! drilled into, thinned out, and frozen as snapshots.
//!
//! - [`Metric`] - Which feature dimensions distances see, optionally z-scored
//! - [`ClusterAlgorithm`] - K-Means or agglomerative partitioning
//! - [`ClusterEngine`] - Feature registry, runs, drill-downs, distillation
//! - [`ClusterForest`] - Arena of runs and assignment records
//! - [`SnapshotStore`] - Immutable membership snapshots behind a [`Store`]
//!
//! # Usage
//!
//! ```rust
//! use lutlab_analysis::FeatureVector;
//! use lutlab_cluster::{ClusterEngine, ClusterParams, NamePolicy, SnapshotStore};
//!
//! let engine = ClusterEngine::new();
//! for (id, hue) in [("a", 10.0), ("b", 12.0), ("c", 200.0), ("d", 205.0)] {
//!     let fv = FeatureVector { h_mean: hue, s_mean: 0.5, s_var: 0.0, v_var: 0.02, contrast_rgb: 0.9 };
//!     engine.upsert_features(id, fv);
//! }
//!
//! let run = engine.cluster(None, &ClusterParams::with_k(2)).unwrap();
//! let child = engine.drill_down(run.tree_id, "0", &ClusterParams::with_k(1)).unwrap();
//! assert_eq!(child.parent_path.as_deref(), Some("0"));
//!
//! let store = SnapshotStore::in_memory(NamePolicy::Unique);
//! let snap = engine.snapshot_of(run.run_id, "by-hue").unwrap();
//! store.commit(&snap).unwrap();
//! ```
//!
//! # Determinism
//!
//! Identical feature vectors, member order, metric, `k`, algorithm and
//! seed always reproduce identical assignments. Cluster ids are numbered
//! by first appearance in member order.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod agglomerative;
pub mod algorithm;
pub mod engine;
mod error;
pub mod forest;
pub mod kmeans;
pub mod metric;
pub mod snapshot;
pub mod store;

pub use algorithm::{ClusterAlgorithm, Partition};
pub use agglomerative::Linkage;
pub use engine::{ClusterEngine, ClusterParams, DistillMode, DistillReport};
pub use error::{ClusterError, ClusterResult};
pub use forest::{AssignmentId, ClusterAssignment, ClusterForest, ClusterRun, RunId, TreeId};
pub use metric::Metric;
pub use snapshot::{ClusterSnapshot, NamePolicy, SnapshotStore};
pub use store::{JsonDirStore, Keyed, MemoryStore, Store};

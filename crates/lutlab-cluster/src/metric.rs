//! Feature-space metric: which dimensions clustering sees.
//!
//! A [`Metric`] picks a subset of [`FeatureDim`]s and optionally z-scores
//! them over the population being clustered, so hue (degrees) does not
//! swamp the unit-range statistics. Distances are Euclidean in the
//! projected space.

use crate::{ClusterError, ClusterResult};
use lutlab_analysis::{FeatureDim, FeatureVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dimension subset plus scaling used to build clustering points.
///
/// # Example
///
/// ```rust
/// use lutlab_cluster::Metric;
///
/// let m: Metric = "z:s_mean,v_var".parse().unwrap();
/// assert!(m.standardize);
/// assert_eq!(m.to_string(), "z:s_mean,v_var");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Projected dimensions, in order.
    pub dims: Vec<FeatureDim>,
    /// Z-score each dimension over the clustered population.
    #[serde(default)]
    pub standardize: bool,
}

impl Default for Metric {
    fn default() -> Self {
        Self::all()
    }
}

impl Metric {
    /// All five dimensions, unscaled.
    pub fn all() -> Self {
        Self {
            dims: FeatureDim::ALL.to_vec(),
            standardize: false,
        }
    }

    /// Builds a metric over `dims`, dropping repeated dimensions.
    pub fn new(dims: impl IntoIterator<Item = FeatureDim>) -> ClusterResult<Self> {
        let mut unique = Vec::new();
        for d in dims {
            if !unique.contains(&d) {
                unique.push(d);
            }
        }
        if unique.is_empty() {
            return Err(ClusterError::InvalidArgument("metric has no dimensions".into()));
        }
        Ok(Self {
            dims: unique,
            standardize: false,
        })
    }

    /// Enables z-score standardization.
    pub fn standardized(mut self) -> Self {
        self.standardize = true;
        self
    }

    /// Projects feature vectors into metric space.
    ///
    /// # Errors
    ///
    /// [`ClusterError::InvalidArgument`] if a projected value is not finite.
    pub fn project(&self, vectors: &[FeatureVector]) -> ClusterResult<Vec<Vec<f64>>> {
        let mut points: Vec<Vec<f64>> = vectors.iter().map(|v| v.project(&self.dims)).collect();
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ClusterError::InvalidArgument(
                "feature vector has non-finite components".into(),
            ));
        }
        if self.standardize && !points.is_empty() {
            let n = points.len() as f64;
            for d in 0..self.dims.len() {
                let mean = points.iter().map(|p| p[d]).sum::<f64>() / n;
                let var = points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                let scale = if std > 0.0 { std } else { 1.0 };
                for p in &mut points {
                    p[d] = (p[d] - mean) / scale;
                }
            }
        }
        Ok(points)
    }
}

/// Euclidean distance between two points of equal dimension.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.standardize {
            f.write_str("z:")?;
        }
        let names: Vec<&str> = self.dims.iter().map(|d| d.name()).collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for Metric {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (standardize, body) = match s.trim().strip_prefix("z:") {
            Some(rest) => (true, rest),
            None => (false, s.trim()),
        };
        let mut metric = if body.eq_ignore_ascii_case("all") {
            Metric::all()
        } else {
            let dims = body
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.parse::<FeatureDim>().map_err(ClusterError::InvalidArgument))
                .collect::<ClusterResult<Vec<_>>>()?;
            Metric::new(dims)?
        };
        metric.standardize = standardize;
        Ok(metric)
    }
}

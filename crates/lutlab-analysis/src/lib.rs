//! # lutlab-analysis
//!
//! Deterministic statistics and categorical tags derived from a LUT
//! lattice itself (not from any image it was applied to).
//!
//! - [`FeatureVector`] - HSV aggregate statistics of all lattice entries
//! - [`classify`] - Fixed-threshold tone / saturation / contrast tags
//!
//! # Usage
//!
//! ```rust
//! use lutlab_analysis::{analyze, Tone};
//! use lutlab_lut::Lattice;
//!
//! let analysis = analyze("identity", &Lattice::identity(9));
//! assert_eq!(analysis.features.contrast_rgb, 1.0);
//! assert_ne!(analysis.tags.tone, Tone::Warm);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod classify;
pub mod features;
pub mod hsv;

pub use classify::{ClassificationTag, Contrast, Saturation, Thresholds, Tone, classify, classify_with};
pub use features::{FeatureDim, FeatureVector};

use lutlab_lut::Lattice;
use serde::{Deserialize, Serialize};

/// Features and tags of one LUT, the record written per analyzed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LutAnalysis {
    /// Caller-assigned LUT identifier.
    pub lut_id: String,
    /// Lattice statistics.
    pub features: FeatureVector,
    /// Tags derived from `features`.
    pub tags: ClassificationTag,
}

/// Extracts features and tags with the default thresholds.
pub fn analyze(lut_id: impl Into<String>, lattice: &Lattice) -> LutAnalysis {
    analyze_with(lut_id, lattice, &Thresholds::default())
}

/// Extracts features and tags with explicit thresholds.
pub fn analyze_with(
    lut_id: impl Into<String>,
    lattice: &Lattice,
    thresholds: &Thresholds,
) -> LutAnalysis {
    let features = FeatureVector::extract(lattice);
    LutAnalysis {
        lut_id: lut_id.into(),
        tags: classify_with(&features, thresholds),
        features,
    }
}

//! Lattice feature extraction.
//!
//! Every lattice entry is converted to HSV and the statistics are taken
//! over all entries:
//!
//! | Field          | Definition                                  |
//! |----------------|---------------------------------------------|
//! | `h_mean`       | mean hue, degrees                           |
//! | `s_mean`       | mean saturation                             |
//! | `s_var`        | population variance of saturation           |
//! | `v_var`        | population variance of value                |
//! | `contrast_rgb` | max minus min over all RGB components       |
//!
//! Extraction is a pure function: summation order is fixed, so repeated
//! calls on the same lattice return bit-identical vectors. An empty
//! lattice produces NaN statistics.

use crate::hsv::rgb_to_hsv;
use lutlab_lut::Lattice;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregate photometric statistics of one lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean hue in degrees.
    pub h_mean: f64,
    /// Mean saturation.
    pub s_mean: f64,
    /// Variance of saturation.
    pub s_var: f64,
    /// Variance of value (brightness).
    pub v_var: f64,
    /// Spread of all RGB components.
    pub contrast_rgb: f64,
}

impl FeatureVector {
    /// Computes the feature vector of a lattice.
    pub fn extract(lattice: &Lattice) -> Self {
        let entries = lattice.entries();
        let n = entries.len() as f64;

        let mut hs = Vec::with_capacity(entries.len());
        let mut ss = Vec::with_capacity(entries.len());
        let mut vs = Vec::with_capacity(entries.len());
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;

        for rgb in entries {
            let rgb = rgb.map(f64::from);
            for c in rgb {
                lo = lo.min(c);
                hi = hi.max(c);
            }
            let [h, s, v] = rgb_to_hsv(rgb);
            hs.push(h);
            ss.push(s);
            vs.push(v);
        }

        let s_mean = mean(&ss, n);
        let v_mean = mean(&vs, n);
        Self {
            h_mean: mean(&hs, n),
            s_mean,
            s_var: variance(&ss, s_mean, n),
            v_var: variance(&vs, v_mean, n),
            contrast_rgb: if entries.is_empty() { f64::NAN } else { hi - lo },
        }
    }

    /// Value of one dimension.
    pub fn get(&self, dim: FeatureDim) -> f64 {
        match dim {
            FeatureDim::HMean => self.h_mean,
            FeatureDim::SMean => self.s_mean,
            FeatureDim::SVar => self.s_var,
            FeatureDim::VVar => self.v_var,
            FeatureDim::ContrastRgb => self.contrast_rgb,
        }
    }

    /// All dimensions in [`FeatureDim::ALL`] order.
    pub fn to_array(&self) -> [f64; 5] {
        FeatureDim::ALL.map(|d| self.get(d))
    }

    /// Projects onto a subset of dimensions.
    pub fn project(&self, dims: &[FeatureDim]) -> Vec<f64> {
        dims.iter().map(|&d| self.get(d)).collect()
    }

    /// Returns `true` if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

fn mean(values: &[f64], n: f64) -> f64 {
    values.iter().sum::<f64>() / n
}

fn variance(values: &[f64], mean: f64, n: f64) -> f64 {
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// One dimension of a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDim {
    /// `h_mean`
    HMean,
    /// `s_mean`
    SMean,
    /// `s_var`
    SVar,
    /// `v_var`
    VVar,
    /// `contrast_rgb`
    ContrastRgb,
}

impl FeatureDim {
    /// Every dimension, in field order.
    pub const ALL: [FeatureDim; 5] = [
        FeatureDim::HMean,
        FeatureDim::SMean,
        FeatureDim::SVar,
        FeatureDim::VVar,
        FeatureDim::ContrastRgb,
    ];

    /// Field name of the dimension.
    pub fn name(self) -> &'static str {
        match self {
            FeatureDim::HMean => "h_mean",
            FeatureDim::SMean => "s_mean",
            FeatureDim::SVar => "s_var",
            FeatureDim::VVar => "v_var",
            FeatureDim::ContrastRgb => "contrast_rgb",
        }
    }
}

impl fmt::Display for FeatureDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureDim {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureDim::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown feature dimension: {s}"))
    }
}

//! Threshold classification of feature vectors.
//!
//! | Tag        | Rule                                                                 |
//! |------------|----------------------------------------------------------------------|
//! | tone       | `warm` if `h_mean` in `[0, 30]` or `[330, 360]`; `cool` if in `[180, 240]`; else `neutral` |
//! | saturation | `low` if `s_mean < 0.2`; if `s_mean > 0.6`: `high` when `s_var <= 0.1`, else `medium`; otherwise `medium` |
//! | contrast   | `low` if `contrast_rgb < 0.5` and `v_var < 0.01`; `high` if `contrast_rgb > 0.8` and `v_var > 0.05`; else `medium` |
//!
//! Non-finite inputs never match a rule and fall back to `neutral` /
//! `medium`. Thresholds are passed explicitly as a [`Thresholds`] value;
//! there is no global configuration.

use crate::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Warm / cool / neutral hue tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Reds and oranges.
    Warm,
    /// Cyans and blues.
    Cool,
    /// Anything else, including undefined hue.
    Neutral,
}

/// Saturation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Saturation {
    /// Washed out.
    Low,
    /// Default bucket.
    Medium,
    /// Uniformly saturated.
    High,
}

/// Contrast tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    /// Compressed range.
    Low,
    /// Default bucket.
    Medium,
    /// Wide range with strong brightness spread.
    High,
}

/// Tag triple for one LUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassificationTag {
    /// Hue tag.
    pub tone: Tone,
    /// Saturation tag.
    pub saturation: Saturation,
    /// Contrast tag.
    pub contrast: Contrast,
}

/// Rule boundaries used by [`classify_with`].
///
/// All ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Hue ranges (degrees) tagged warm.
    pub warm_hue: Vec<(f64, f64)>,
    /// Hue ranges (degrees) tagged cool.
    pub cool_hue: Vec<(f64, f64)>,
    /// `s_mean` below this is low.
    pub sat_low: f64,
    /// `s_mean` above this may be high.
    pub sat_high: f64,
    /// Largest `s_var` still counted as high.
    pub sat_high_max_var: f64,
    /// `contrast_rgb` below this may be low.
    pub contrast_low: f64,
    /// `v_var` below this may be low.
    pub contrast_low_v_var: f64,
    /// `contrast_rgb` above this may be high.
    pub contrast_high: f64,
    /// `v_var` above this may be high.
    pub contrast_high_v_var: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warm_hue: vec![(0.0, 30.0), (330.0, 360.0)],
            cool_hue: vec![(180.0, 240.0)],
            sat_low: 0.2,
            sat_high: 0.6,
            sat_high_max_var: 0.1,
            contrast_low: 0.5,
            contrast_low_v_var: 0.01,
            contrast_high: 0.8,
            contrast_high_v_var: 0.05,
        }
    }
}

/// Classifies with the default thresholds.
///
/// # Example
///
/// ```rust
/// use lutlab_analysis::{classify, FeatureVector, Tone};
///
/// let fv = FeatureVector { h_mean: 10.0, s_mean: 0.4, s_var: 0.0, v_var: 0.02, contrast_rgb: 0.6 };
/// assert_eq!(classify(&fv).tone, Tone::Warm);
/// ```
pub fn classify(features: &FeatureVector) -> ClassificationTag {
    classify_with(features, &Thresholds::default())
}

/// Classifies with explicit thresholds.
pub fn classify_with(features: &FeatureVector, t: &Thresholds) -> ClassificationTag {
    ClassificationTag {
        tone: tone(features.h_mean, t),
        saturation: saturation(features.s_mean, features.s_var, t),
        contrast: contrast(features.contrast_rgb, features.v_var, t),
    }
}

fn in_ranges(v: f64, ranges: &[(f64, f64)]) -> bool {
    ranges.iter().any(|&(lo, hi)| v >= lo && v <= hi)
}

fn tone(h_mean: f64, t: &Thresholds) -> Tone {
    if !h_mean.is_finite() {
        return Tone::Neutral;
    }
    if in_ranges(h_mean, &t.warm_hue) {
        Tone::Warm
    } else if in_ranges(h_mean, &t.cool_hue) {
        Tone::Cool
    } else {
        Tone::Neutral
    }
}

fn saturation(s_mean: f64, s_var: f64, t: &Thresholds) -> Saturation {
    if !s_mean.is_finite() {
        return Saturation::Medium;
    }
    if s_mean < t.sat_low {
        Saturation::Low
    } else if s_mean > t.sat_high {
        if s_var.is_finite() && s_var <= t.sat_high_max_var {
            Saturation::High
        } else {
            Saturation::Medium
        }
    } else {
        Saturation::Medium
    }
}

fn contrast(contrast_rgb: f64, v_var: f64, t: &Thresholds) -> Contrast {
    if !contrast_rgb.is_finite() || !v_var.is_finite() {
        return Contrast::Medium;
    }
    if contrast_rgb < t.contrast_low && v_var < t.contrast_low_v_var {
        Contrast::Low
    } else if contrast_rgb > t.contrast_high && v_var > t.contrast_high_v_var {
        Contrast::High
    } else {
        Contrast::Medium
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tone::Warm => "warm",
            Tone::Cool => "cool",
            Tone::Neutral => "neutral",
        })
    }
}

impl fmt::Display for Saturation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Saturation::Low => "low",
            Saturation::Medium => "medium",
            Saturation::High => "high",
        })
    }
}

impl fmt::Display for Contrast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Contrast::Low => "low",
            Contrast::Medium => "medium",
            Contrast::High => "high",
        })
    }
}

impl fmt::Display for ClassificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tone, self.saturation, self.contrast)
    }
}

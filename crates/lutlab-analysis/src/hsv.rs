//! RGB to HSV conversion.
//!
//! Standard max/min/delta construction with hue in degrees:
//!
//! - `v = max(r, g, b)`
//! - `s = (max - min) / v`, or `0` for black
//! - `h` from the 60 degree sector of the maximal channel, wrapped into
//!   `[0, 360)`; achromatic colors get `h = 0`

/// Converts RGB to `[h, s, v]` with `h` in degrees `[0, 360)`.
#[inline]
pub fn rgb_to_hsv(rgb: [f64; 3]) -> [f64; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    // -tiny + 360 rounds to 360
    let h = if h >= 360.0 { h - 360.0 } else { h };

    let s = if max > 0.0 { delta / max } else { 0.0 };
    [h, s, max]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn primaries() {
        assert_eq!(rgb_to_hsv([1.0, 0.0, 0.0]), [0.0, 1.0, 1.0]);
        assert_eq!(rgb_to_hsv([0.0, 1.0, 0.0]), [120.0, 1.0, 1.0]);
        assert_eq!(rgb_to_hsv([0.0, 0.0, 1.0]), [240.0, 1.0, 1.0]);
        assert_eq!(rgb_to_hsv([1.0, 0.0, 1.0]), [300.0, 1.0, 1.0]);
    }

    #[test]
    fn achromatic_has_zero_hue_and_saturation() {
        assert_eq!(rgb_to_hsv([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
        assert_eq!(rgb_to_hsv([0.4, 0.4, 0.4]), [0.0, 0.0, 0.4]);
    }

    #[test]
    fn negative_sector_wraps() {
        let [h, s, v] = rgb_to_hsv([1.0, 0.0, 0.5]);
        assert_relative_eq!(h, 330.0);
        assert_relative_eq!(s, 1.0);
        assert_relative_eq!(v, 1.0);
    }

    #[test]
    fn hue_stays_below_360() {
        let [h, _, _] = rgb_to_hsv([1.0, 0.0, 1e-18]);
        assert!((0.0..360.0).contains(&h));
    }
}

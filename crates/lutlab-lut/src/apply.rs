//! Nearest-point lattice transform.
//!
//! Each channel value `c` is snapped to lattice index
//! `clamp(round(c * (N - 1)), 0, N - 1)` and the entry at
//! `lattice[b][g][r]` replaces the pixel. Rounding is half-to-even, the
//! convention of array `round`, so ties land on the same grid point as the
//! reference implementation.
//!
//! The image pass runs as two array passes, both row-parallel:
//!
//! 1. index pass: every pixel becomes one flat gather index
//! 2. gather pass: every output pixel copies its lattice entry
//!
//! Neither pass branches per pixel; the float-to-index cast saturates, so
//! negative and NaN inputs land on index 0 and large inputs are capped.

use crate::{Lattice, LutError, LutResult};
use lutlab_core::ImageBuf;
use rayon::prelude::*;
use tracing::trace;

/// Maps one channel value to its nearest lattice index.
#[inline]
fn axis_index(c: f32, scale: f32, max: usize) -> usize {
    ((c * scale).round_ties_even() as usize).min(max)
}

/// Rejects lattices that cannot be indexed at every grid point.
fn ensure_applicable(lattice: &Lattice) -> LutResult<()> {
    if !lattice.is_complete() {
        return Err(LutError::UnsupportedFormat(format!(
            "lattice has {} of {} entries",
            lattice.entries().len(),
            lattice.expected_entries()
        )));
    }
    Ok(())
}

/// Applies the lattice to a single RGB value.
///
/// # Example
///
/// ```rust
/// use lutlab_lut::{Lattice, apply};
///
/// let lut = Lattice::identity(5);
/// assert_eq!(apply::apply_rgb(&lut, [0.5, 0.25, 1.0]).unwrap(), [0.5, 0.25, 1.0]);
/// ```
pub fn apply_rgb(lattice: &Lattice, rgb: [f32; 3]) -> LutResult<[f32; 3]> {
    ensure_applicable(lattice)?;
    let idx = gather_index(lattice, rgb);
    Ok(clamp_unit(lattice.entries()[idx]))
}

/// Applies the lattice to every pixel of an RGB image.
///
/// Returns a new image of the same size with values clamped to `[0, 1]`.
///
/// # Errors
///
/// - [`LutError::UnsupportedFormat`] if the lattice is incomplete or the
///   image does not have exactly three channels
pub fn apply_image(lattice: &Lattice, image: &ImageBuf) -> LutResult<ImageBuf> {
    ensure_applicable(lattice)?;
    if image.channels != 3 {
        return Err(LutError::UnsupportedFormat(format!(
            "expected 3-channel image, got {}",
            image.channels
        )));
    }
    trace!(
        width = image.width,
        height = image.height,
        size = lattice.size(),
        "apply::apply_image"
    );

    let indices = gather_indices(lattice, &image.data, image.width as usize);
    let data = gather(lattice, &indices, image.width as usize);
    Ok(ImageBuf::new(image.width, image.height, 3, data)?)
}

/// Index pass: flat lattice index for every pixel of interleaved RGB data.
pub fn gather_indices(lattice: &Lattice, rgb: &[f32], width: usize) -> Vec<usize> {
    let row = width.max(1);
    let mut indices = vec![0usize; rgb.len() / 3];
    indices
        .par_chunks_mut(row)
        .zip(rgb.par_chunks(row * 3))
        .for_each(|(out, src)| {
            for (dst, px) in out.iter_mut().zip(src.chunks_exact(3)) {
                *dst = gather_index(lattice, [px[0], px[1], px[2]]);
            }
        });
    indices
}

/// Gather pass: interleaved RGB output for precomputed indices.
fn gather(lattice: &Lattice, indices: &[usize], width: usize) -> Vec<f32> {
    let row = width.max(1);
    let entries = lattice.entries();
    let mut out = vec![0.0f32; indices.len() * 3];
    out.par_chunks_mut(row * 3)
        .zip(indices.par_chunks(row))
        .for_each(|(dst, idx)| {
            for (px, &i) in dst.chunks_exact_mut(3).zip(idx) {
                px.copy_from_slice(&clamp_unit(entries[i]));
            }
        });
    out
}

#[inline]
fn gather_index(lattice: &Lattice, rgb: [f32; 3]) -> usize {
    let max = lattice.size() - 1;
    let scale = max as f32;
    let r = axis_index(rgb[0], scale, max);
    let g = axis_index(rgb[1], scale, max);
    let b = axis_index(rgb[2], scale, max);
    lattice.flat_index(b, g, r)
}

#[inline]
fn clamp_unit(rgb: [f32; 3]) -> [f32; 3] {
    rgb.map(|v| v.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube;
    use approx::assert_abs_diff_eq;

    fn on_grid_image(size: usize) -> ImageBuf {
        let step = (size - 1) as f32;
        let mut data = Vec::new();
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.extend_from_slice(&[r as f32 / step, g as f32 / step, b as f32 / step]);
                }
            }
        }
        let w = (size * size) as u32;
        ImageBuf::new(w, size as u32, 3, data).unwrap()
    }

    #[test]
    fn identity_roundtrip() {
        let lut = Lattice::identity(4);
        let img = on_grid_image(4);
        let out = apply_image(&lut, &img).unwrap();
        assert_eq!(out.width, img.width);
        for (a, b) in img.data.iter().zip(&out.data) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn snaps_to_nearest_point() {
        let lut = Lattice::identity(4);
        // 0.4 * 3 = 1.2 -> 1, 0.9 * 3 = 2.7 -> 3
        let out = apply_rgb(&lut, [0.4, 0.9, 0.0]).unwrap();
        assert_abs_diff_eq!(out[0], 1.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 1.0, epsilon = 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn ties_round_to_even() {
        let lut = Lattice::identity(2);
        // 0.5 * 1 = 0.5 -> 0
        assert_eq!(apply_rgb(&lut, [0.5, 0.5, 0.5]).unwrap(), [0.0, 0.0, 0.0]);
        let lut = Lattice::identity(4);
        // 0.5 * 3 = 1.5 -> 2
        let out = apply_rgb(&lut, [0.5, 0.0, 0.0]).unwrap();
        assert_abs_diff_eq!(out[0], 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn out_of_range_and_nan_are_clamped() {
        let lut = Lattice::identity(3);
        assert_eq!(apply_rgb(&lut, [-0.3, 7.0, f32::NAN]).unwrap(), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn axis_roles_follow_file_order() {
        // Lattice that swaps red and blue.
        let mut text = String::from("LUT_3D_SIZE 2\n");
        for b in 0..2 {
            for g in 0..2 {
                for r in 0..2 {
                    text.push_str(&format!("{b} {g} {r}\n"));
                }
            }
        }
        let lut = cube::parse_str(&text).unwrap().lattice;
        assert_eq!(apply_rgb(&lut, [1.0, 0.0, 0.0]).unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(apply_rgb(&lut, [0.0, 1.0, 1.0]).unwrap(), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn incomplete_lattice_is_rejected() {
        let parsed = cube::parse_str("LUT_3D_SIZE 2\n0 0 0\n").unwrap();
        let img = ImageBuf::zeros(1, 1, 3).unwrap();
        assert!(matches!(
            apply_image(&parsed.lattice, &img),
            Err(LutError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rgba_is_rejected() {
        let img = ImageBuf::zeros(2, 2, 4).unwrap();
        assert!(matches!(
            apply_image(&Lattice::identity(2), &img),
            Err(LutError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn matches_single_pixel_path() {
        let text: String = std::iter::once("LUT_3D_SIZE 3\n".to_string())
            .chain((0..27).map(|i| {
                let v = i as f32 / 26.0;
                format!("{} {} {}\n", v, 1.0 - v, (v * 0.5).min(1.0))
            }))
            .collect();
        let lut = cube::parse_str(&text).unwrap().lattice;
        let data: Vec<f32> = (0..5 * 7 * 3).map(|i| (i % 11) as f32 / 10.0).collect();
        let img = ImageBuf::new(5, 7, 3, data).unwrap();
        let out = apply_image(&lut, &img).unwrap();
        for (src, dst) in img.data.chunks_exact(3).zip(out.data.chunks_exact(3)) {
            let expected = apply_rgb(&lut, [src[0], src[1], src[2]]).unwrap();
            assert_eq!(dst, &expected);
        }
    }
}

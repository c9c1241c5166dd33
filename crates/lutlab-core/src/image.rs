//! Normalized float image buffer.
//!
//! [`ImageBuf`] is the exchange type between image decoding, the lattice
//! transform and image encoding. Samples are `f32`, interleaved per pixel,
//! rows top to bottom.
//!
//! # Example
//!
//! ```rust
//! use lutlab_core::ImageBuf;
//!
//! let img = ImageBuf::from_u8(1, 1, 3, &[255, 128, 0]).unwrap();
//! assert_eq!(img.pixel(0, 0), &[1.0, 128.0 / 255.0, 0.0]);
//! ```

use crate::{Error, Result};

/// Interleaved `f32` image with values nominally in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuf {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of channels (3 for RGB, 4 for RGBA).
    pub channels: u32,
    /// Interleaved sample data, `width * height * channels` long.
    pub data: Vec<f32>,
}

impl ImageBuf {
    /// Wraps existing samples, validating the buffer length.
    pub fn new(width: u32, height: u32, channels: u32, data: Vec<f32>) -> Result<Self> {
        let expected = sample_len(width, height, channels)?;
        if data.len() != expected {
            return Err(Error::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Creates a black image.
    pub fn zeros(width: u32, height: u32, channels: u32) -> Result<Self> {
        let len = sample_len(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![0.0; len],
        })
    }

    /// Creates an image from 8-bit samples, scaling into `[0, 1]`.
    pub fn from_u8(width: u32, height: u32, channels: u32, data: &[u8]) -> Result<Self> {
        let samples = data.iter().map(|&v| v as f32 / 255.0).collect();
        Self::new(width, height, channels, samples)
    }

    /// Creates an image from 16-bit samples, scaling into `[0, 1]`.
    pub fn from_u16(width: u32, height: u32, channels: u32, data: &[u16]) -> Result<Self> {
        let samples = data.iter().map(|&v| v as f32 / 65535.0).collect();
        Self::new(width, height, channels, samples)
    }

    /// Quantizes to 8-bit, clamping out-of-range values.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns the number of samples in one row.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Returns the samples of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.data[start..start + c]
    }

    /// Returns `true` when every sample is finite and inside `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        self.data.iter().all(|v| (0.0..=1.0).contains(v))
    }

    /// Splits an RGBA image into its RGB part and the alpha plane.
    ///
    /// RGB images are returned unchanged with no alpha.
    pub fn split_alpha(self) -> Result<(ImageBuf, Option<Vec<f32>>)> {
        match self.channels {
            3 => Ok((self, None)),
            4 => {
                let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
                let mut alpha = Vec::with_capacity(self.pixel_count());
                for px in self.data.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                    alpha.push(px[3]);
                }
                let rgb = ImageBuf::new(self.width, self.height, 3, rgb)?;
                Ok((rgb, Some(alpha)))
            }
            got => Err(Error::ChannelMismatch { expected: 3, got }),
        }
    }

    /// Re-attaches an alpha plane to an RGB image.
    pub fn with_alpha(self, alpha: &[f32]) -> Result<ImageBuf> {
        if self.channels != 3 {
            return Err(Error::ChannelMismatch {
                expected: 3,
                got: self.channels,
            });
        }
        if alpha.len() != self.pixel_count() {
            return Err(Error::DataLength {
                expected: self.pixel_count(),
                got: alpha.len(),
            });
        }
        let mut rgba = Vec::with_capacity(self.pixel_count() * 4);
        for (px, &a) in self.data.chunks_exact(3).zip(alpha) {
            rgba.extend_from_slice(px);
            rgba.push(a);
        }
        ImageBuf::new(self.width, self.height, 4, rgba)
    }
}

fn sample_len(width: u32, height: u32, channels: u32) -> Result<usize> {
    let invalid = |reason: &str| Error::InvalidDimensions {
        width,
        height,
        channels,
        reason: reason.to_string(),
    };
    if width == 0 || height == 0 || channels == 0 {
        return Err(invalid("all dimensions must be > 0"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels as usize))
        .ok_or_else(|| invalid("sample count overflows"))
}

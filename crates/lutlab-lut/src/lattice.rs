//! 3-dimensional color lattice.
//!
//! A lattice maps RGB input to RGB output through a cube of color values.
//! It is produced by the `.cube` parser and never mutated afterwards;
//! re-ingesting a resource yields a fresh lattice.

use crate::{LutError, LutResult};

/// An immutable `N x N x N` lattice of RGB entries.
///
/// # Structure
///
/// - Entries are stored flat in file order: red fastest, then green, then
///   blue (`index = b*N^2 + g*N + r`)
/// - Components are in `[0, 1]`
/// - A lattice built from a truncated file may hold fewer than `N^3`
///   entries; see [`Lattice::is_complete`]
///
/// # Example
///
/// ```rust
/// use lutlab_lut::Lattice;
///
/// let lut = Lattice::identity(4);
/// assert_eq!(lut.get(3, 0, 1), [1.0 / 3.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    size: usize,
    data: Vec<[f32; 3]>,
    title: Option<String>,
}

impl Lattice {
    /// Creates an identity (pass-through) lattice.
    ///
    /// # Panics
    ///
    /// Panics if `size < 2`.
    pub fn identity(size: usize) -> Self {
        assert!(size >= 2, "identity lattice needs at least 2 points per axis");
        let step = (size - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.push([r as f32 / step, g as f32 / step, b as f32 / step]);
                }
            }
        }
        Self {
            data,
            size,
            title: None,
        }
    }

    /// Creates a lattice from raw data in file order.
    ///
    /// Data must hold exactly `size^3` entries.
    pub fn from_data(data: Vec<[f32; 3]>, size: usize) -> LutResult<Self> {
        if size == 0 {
            return Err(LutError::Format("lattice size must be > 0".into()));
        }
        let expected = cube_len(size)
            .ok_or_else(|| LutError::Format(format!("lattice size {size} is too large")))?;
        if data.len() != expected {
            return Err(LutError::Format(format!(
                "expected {} entries for size {}, got {}",
                expected,
                size,
                data.len()
            )));
        }
        Ok(Self {
            data,
            size,
            title: None,
        })
    }

    /// Builds a lattice from whatever the parser collected, complete or not.
    pub(crate) fn from_parsed(size: usize, data: Vec<[f32; 3]>, title: Option<String>) -> Self {
        Self { size, data, title }
    }

    /// Attaches a display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Lattice dimension `N`.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Title from the `TITLE` keyword, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// All parsed entries in file order.
    #[inline]
    pub fn entries(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Number of entries a complete lattice holds (`N^3`).
    ///
    /// Saturates at `usize::MAX`, so an unrepresentable size is never
    /// complete.
    #[inline]
    pub fn expected_entries(&self) -> usize {
        cube_len(self.size).unwrap_or(usize::MAX)
    }

    /// Returns `true` if every grid point has an entry.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.data.len() >= self.expected_entries()
    }

    /// Flat index of grid point `(slow, mid, fast)`.
    #[inline]
    pub fn flat_index(&self, slow: usize, mid: usize, fast: usize) -> usize {
        slow * self.size * self.size + mid * self.size + fast
    }

    /// Gets the entry at grid point `lattice[slow][mid][fast]`.
    ///
    /// # Panics
    ///
    /// Panics if the point is outside the parsed data.
    #[inline]
    pub fn get(&self, slow: usize, mid: usize, fast: usize) -> [f32; 3] {
        self.data[self.flat_index(slow, mid, fast)]
    }
}

/// `size^3`, or `None` if it does not fit in `usize`.
pub(crate) fn cube_len(size: usize) -> Option<usize> {
    size.checked_pow(3)
}

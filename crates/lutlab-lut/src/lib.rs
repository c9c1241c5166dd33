//! # lutlab-lut
//!
//! 3D lookup-table lattices for color grading LUTs.
//!
//! - [`Lattice`] - Immutable `N x N x N` cube of RGB entries
//! - [`cube`] - `.cube` text parsing and writing
//! - [`apply`] - Nearest-point lattice transform for images
//!
//! # Usage
//!
//! ```rust
//! use lutlab_lut::{cube, apply};
//!
//! let text = "LUT_3D_SIZE 2\n\
//!     0 0 0\n1 0 0\n0 1 0\n1 1 0\n0 0 1\n1 0 1\n0 1 1\n1 1 1\n";
//! let parsed = cube::parse_str(text).unwrap();
//! assert!(parsed.warnings.is_empty());
//!
//! let out = apply::apply_rgb(&parsed.lattice, [0.9, 0.2, 0.7]).unwrap();
//! assert_eq!(out, [1.0, 0.0, 1.0]);
//! ```
//!
//! # Axis convention
//!
//! `.cube` files list entries with the first (red) channel varying fastest
//! and the third (blue) channel slowest. The lattice keeps that order, so
//! `lattice[b][g][r]` is entry `b*N^2 + g*N + r`, and lookups index it the
//! same way.
//!
//! # Fidelity
//!
//! Lookups snap each channel to the nearest lattice point; there is no
//! trilinear or tetrahedral interpolation.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod lattice;
pub mod apply;
pub mod cube;

pub use error::{LutError, LutResult};
pub use lattice::Lattice;
pub use cube::{ParseWarning, ParsedCube, parse_str, read_3d, write_3d};

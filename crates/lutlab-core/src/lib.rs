//! # lutlab-core
//!
//! Core types shared by every lutlab crate.
//!
//! - [`ImageBuf`] - Interleaved, normalized `f32` image buffer
//! - [`Error`], [`Result`] - Buffer validation errors
//!
//! ## Crate Structure
//!
//! ```text
//! lutlab-core (this crate)
//!    ^
//!    +-- lutlab-lut (lattice parsing and transform)
//!    +-- lutlab-io (PNG read/write)
//!    +-- lutlab-batch (parallel batch application)
//! ```
//!
//! Pixel values are stored as `f32` in `[0, 1]` with channels interleaved
//! row by row, which is the layout the color transform gathers into.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;

pub use error::{Error, Result};
pub use image::ImageBuf;

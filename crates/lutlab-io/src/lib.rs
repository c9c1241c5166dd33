//! # lutlab-io
//!
//! Image file I/O for lutlab.
//!
//! PNG is the only supported container; [`read`] and [`write`] dispatch
//! on the file extension and reject anything else with
//! [`IoError::UnsupportedFormat`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lutlab_io::{read, write};
//!
//! let image = read("input.png")?;
//! write("output.png", &image)?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod png;

pub use error::{IoError, IoResult};
pub use png::{PngDepth, PngImage};

use lutlab_core::ImageBuf;
use std::path::Path;

/// Image container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Portable Network Graphics.
    Png,
}

impl Format {
    /// Detects the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(Format::Png),
            _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads an image, choosing the decoder by extension.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageBuf> {
    match Format::from_path(&path)? {
        Format::Png => png::read(path),
    }
}

/// Writes an 8-bit image, choosing the encoder by extension.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuf) -> IoResult<()> {
    match Format::from_path(&path)? {
        Format::Png => png::write(path, image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_detection() {
        assert_eq!(Format::from_path("a/b/shot.PNG").unwrap(), Format::Png);
        assert!(matches!(
            Format::from_path("shot.exr"),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(Format::from_path("no_extension").is_err());
    }

    #[test]
    fn dispatch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let image = ImageBuf::from_u8(2, 2, 3, &[0, 64, 128, 255, 1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        write(&path, &image).unwrap();
        assert_eq!(read(&path).unwrap(), image);
        assert!(write(dir.path().join("frame.tif"), &image).is_err());
    }
}

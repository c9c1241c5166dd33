//! PNG format support.
//!
//! Reads 8-bit and 16-bit PNGs into a normalized [`ImageBuf`] and writes
//! buffers back out at either depth.
//!
//! | PNG color type   | Decoded channels |
//! |------------------|------------------|
//! | RGB              | 3                |
//! | RGBA             | 4                |
//! | Grayscale        | 3 (replicated)   |
//! | Grayscale+alpha  | 4 (replicated)   |
//!
//! Palette and sub-byte images are rejected with
//! [`IoError::UnsupportedBitDepth`].

use crate::{IoError, IoResult};
use lutlab_core::ImageBuf;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

/// Sample depth used when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngDepth {
    /// 8 bits per sample.
    #[default]
    Eight,
    /// 16 bits per sample.
    Sixteen,
}

/// Decoded image plus the depth it was stored at.
#[derive(Debug, Clone, PartialEq)]
pub struct PngImage {
    /// Normalized samples.
    pub image: ImageBuf,
    /// Source sample depth.
    pub depth: PngDepth,
}

/// Reads a PNG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageBuf> {
    Ok(read_with_depth(path)?.image)
}

/// Reads a PNG file and reports its sample depth.
pub fn read_with_depth<P: AsRef<Path>>(path: P) -> IoResult<PngImage> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let decoder = png::Decoder::new(BufReader::new(file));
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    let bytes = &buf[..info.buffer_size()];

    let (channels, depth, samples): (u32, PngDepth, Vec<f32>) = match (info.color_type, info.bit_depth) {
        (png::ColorType::Rgb, png::BitDepth::Eight) => (3, PngDepth::Eight, from_u8(bytes)),
        (png::ColorType::Rgba, png::BitDepth::Eight) => (4, PngDepth::Eight, from_u8(bytes)),
        (png::ColorType::Rgb, png::BitDepth::Sixteen) => (3, PngDepth::Sixteen, from_be_u16(bytes)),
        (png::ColorType::Rgba, png::BitDepth::Sixteen) => (4, PngDepth::Sixteen, from_be_u16(bytes)),
        (png::ColorType::Grayscale, png::BitDepth::Eight) => {
            (3, PngDepth::Eight, expand_gray(&from_u8(bytes), false))
        }
        (png::ColorType::Grayscale, png::BitDepth::Sixteen) => {
            (3, PngDepth::Sixteen, expand_gray(&from_be_u16(bytes), false))
        }
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Eight) => {
            (4, PngDepth::Eight, expand_gray(&from_u8(bytes), true))
        }
        (png::ColorType::GrayscaleAlpha, png::BitDepth::Sixteen) => {
            (4, PngDepth::Sixteen, expand_gray(&from_be_u16(bytes), true))
        }
        (color_type, bit_depth) => {
            return Err(IoError::UnsupportedBitDepth(format!("{color_type:?} {bit_depth:?}")));
        }
    };

    debug!(
        path = %path.display(),
        width = info.width,
        height = info.height,
        channels,
        "decoded PNG"
    );
    let image = ImageBuf::new(info.width, info.height, channels, samples)?;
    Ok(PngImage { image, depth })
}

/// Writes an 8-bit PNG.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuf) -> IoResult<()> {
    write_with_depth(path, image, PngDepth::Eight)
}

/// Writes a PNG at the given depth. Samples are clamped to `[0, 1]`.
pub fn write_with_depth<P: AsRef<Path>>(path: P, image: &ImageBuf, depth: PngDepth) -> IoResult<()> {
    let color_type = match image.channels {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(IoError::EncodeError(format!("unsupported channel count: {n}"))),
    };

    let file = File::create(path.as_ref())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width, image.height);
    encoder.set_color(color_type);
    encoder.set_compression(png::Compression::default());
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let bytes = match depth {
        PngDepth::Eight => {
            encoder.set_depth(png::BitDepth::Eight);
            image.to_u8()
        }
        PngDepth::Sixteen => {
            encoder.set_depth(png::BitDepth::Sixteen);
            to_be_u16(&image.data)
        }
    };

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    writer
        .write_image_data(&bytes)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    writer.finish().map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}

fn from_u8(bytes: &[u8]) -> Vec<f32> {
    bytes.iter().map(|&v| v as f32 / 255.0).collect()
}

/// Converts big-endian 16-bit samples.
fn from_be_u16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32 / 65535.0)
        .collect()
}

fn to_be_u16(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&v| ((v.clamp(0.0, 1.0) * 65535.0).round() as u16).to_be_bytes())
        .collect()
}

/// Replicates gray into RGB, keeping alpha when present.
fn expand_gray(samples: &[f32], alpha: bool) -> Vec<f32> {
    if alpha {
        samples
            .chunks_exact(2)
            .flat_map(|ga| [ga[0], ga[0], ga[0], ga[1]])
            .collect()
    } else {
        samples.iter().flat_map(|&g| [g, g, g]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, channels: u32) -> ImageBuf {
        let mut data = Vec::with_capacity((width * height * channels) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 8) as u8);
                data.push((y * 8) as u8);
                data.push(128);
                if channels == 4 {
                    data.push(200);
                }
            }
        }
        ImageBuf::from_u8(width, height, channels, &data).unwrap()
    }

    #[test]
    fn roundtrip_rgb_8bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let image = gradient(32, 16, 3);

        write(&path, &image).unwrap();
        let loaded = read_with_depth(&path).unwrap();

        assert_eq!(loaded.depth, PngDepth::Eight);
        assert_eq!(loaded.image, image);
    }

    #[test]
    fn roundtrip_rgba_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let image = gradient(8, 8, 4);

        write(&path, &image).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!(loaded.channels, 4);
        assert_eq!(loaded.pixel(3, 2)[3], 200.0 / 255.0);
    }

    #[test]
    fn roundtrip_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.png");
        let image = ImageBuf::from_u16(2, 1, 3, &[0, 1000, 65535, 40000, 2, 3]).unwrap();

        write_with_depth(&path, &image, PngDepth::Sixteen).unwrap();
        let loaded = read_with_depth(&path).unwrap();

        assert_eq!(loaded.depth, PngDepth::Sixteen);
        assert_eq!(loaded.image, image);
    }

    #[test]
    fn grayscale_expands_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let gray = ImageBuf::from_u8(2, 1, 1, &[0, 255]).unwrap();

        write(&path, &gray).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!(loaded.channels, 3);
        assert_eq!(loaded.data, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read(dir.path().join("nope.png")), Err(IoError::Io(_))));
    }

    #[test]
    fn garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not a png at all").unwrap();
        assert!(matches!(read(&path), Err(IoError::DecodeError(_))));
    }
}

//! Adobe/Resolve `.cube` 3D LUT format support.
//!
//! # Format
//!
//! ```text
//! # Comment
//! TITLE "LUT Name"
//! LUT_3D_SIZE 33
//! 0.0 0.0 0.0
//! ...
//! 1.0 1.0 1.0
//! ```
//!
//! Only the size directive is mandatory. Entries are read in file order
//! (red fastest, blue slowest). A file whose entry count differs from
//! `N^3` still parses: the lattice keeps what was read and the mismatch is
//! reported as a [`ParseWarning`], because callers routinely hand over
//! partially written files.
//!
//! # Example
//!
//! ```rust,ignore
//! use lutlab_lut::cube;
//!
//! let parsed = cube::read_3d("grade.cube")?;
//! for warning in &parsed.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

use crate::{Lattice, LutError, LutResult};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Non-fatal findings while parsing a `.cube` resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// Number of entries differs from `N^3`.
    EntryCountMismatch {
        /// `N^3`
        expected: usize,
        /// Entries actually collected
        found: usize,
    },
    /// Numeric lines appeared before `LUT_3D_SIZE` and were skipped.
    DataBeforeSize {
        /// Skipped line count
        count: usize,
    },
    /// A keyword line that is not understood was skipped.
    UnknownKeyword {
        /// 1-based line number
        line: usize,
        /// The keyword token
        keyword: String,
    },
    /// A non-default `DOMAIN_MIN`/`DOMAIN_MAX` was declared; lookups always
    /// use the unit domain.
    DomainIgnored,
    /// Components outside `[0, 1]` were clamped.
    ValuesClamped {
        /// Number of clamped components
        count: usize,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntryCountMismatch { expected, found } => {
                write!(f, "expected {expected} entries, found {found}")
            }
            Self::DataBeforeSize { count } => {
                write!(f, "{count} data lines before LUT_3D_SIZE were ignored")
            }
            Self::UnknownKeyword { line, keyword } => {
                write!(f, "line {line}: unknown keyword {keyword}")
            }
            Self::DomainIgnored => write!(f, "non-unit input domain ignored"),
            Self::ValuesClamped { count } => write!(f, "{count} components clamped to [0, 1]"),
        }
    }
}

/// A parsed lattice plus the warnings raised while reading it.
#[derive(Debug, Clone)]
pub struct ParsedCube {
    /// The parsed lattice.
    pub lattice: Lattice,
    /// Non-fatal findings; empty for a well-formed file.
    pub warnings: Vec<ParseWarning>,
}

impl ParsedCube {
    /// Returns `true` if the entry count did not match `N^3`.
    pub fn is_partial(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::EntryCountMismatch { .. }))
    }
}

/// Reads a 3D LUT from a `.cube` file.
pub fn read_3d<P: AsRef<Path>>(path: P) -> LutResult<ParsedCube> {
    let path = path.as_ref();
    debug!(path = %path.display(), "cube::read_3d");
    let file = File::open(path)?;
    parse(BufReader::new(file))
}

/// Parses a 3D LUT from a string.
pub fn parse_str(text: &str) -> LutResult<ParsedCube> {
    parse(Cursor::new(text))
}

/// Parses a 3D LUT from a reader.
pub fn parse<R: BufRead>(reader: R) -> LutResult<ParsedCube> {
    let mut size: Option<usize> = None;
    let mut title: Option<String> = None;
    let mut data: Vec<[f32; 3]> = Vec::new();
    let mut warnings = Vec::new();
    let mut before_size = 0usize;
    let mut clamped = 0usize;
    let mut domain_ignored = false;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let line_no = idx + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        if first.parse::<f32>().is_ok() {
            let rgb = parse_rgb(line, line_no)?;
            if size.is_none() {
                before_size += 1;
                continue;
            }
            data.push(normalize(rgb, &mut clamped));
            continue;
        }

        match first {
            "LUT_3D_SIZE" => {
                if size.is_some() {
                    return Err(LutError::Format(format!(
                        "line {line_no}: duplicate LUT_3D_SIZE"
                    )));
                }
                size = Some(parse_size(tokens.next(), line_no)?);
            }
            "LUT_1D_SIZE" => {
                return Err(LutError::UnsupportedFormat(
                    "1D LUT found, expected LUT_3D_SIZE".into(),
                ));
            }
            "TITLE" => {
                let rest = line["TITLE".len()..].trim().trim_matches('"');
                title = Some(rest.to_string());
            }
            "DOMAIN_MIN" | "DOMAIN_MAX" => {
                let expected = if first == "DOMAIN_MIN" { 0.0 } else { 1.0 };
                let values = parse_floats(tokens, line_no)?;
                if values.iter().any(|&v| v != expected) {
                    domain_ignored = true;
                }
            }
            keyword => warnings.push(ParseWarning::UnknownKeyword {
                line: line_no,
                keyword: keyword.to_string(),
            }),
        }
    }

    let size = size.ok_or_else(|| LutError::Format("missing LUT_3D_SIZE".into()))?;

    if before_size > 0 {
        warnings.push(ParseWarning::DataBeforeSize { count: before_size });
    }
    if domain_ignored {
        warnings.push(ParseWarning::DomainIgnored);
    }
    if clamped > 0 {
        warnings.push(ParseWarning::ValuesClamped { count: clamped });
    }
    // parse_size guarantees N^3 fits
    let expected = crate::lattice::cube_len(size).unwrap_or(usize::MAX);
    if data.len() != expected {
        warnings.push(ParseWarning::EntryCountMismatch {
            expected,
            found: data.len(),
        });
    }

    for w in &warnings {
        warn!(size, warning = %w, "cube parsed with warnings");
    }

    Ok(ParsedCube {
        lattice: Lattice::from_parsed(size, data, title),
        warnings,
    })
}

/// Writes a lattice to a `.cube` file.
///
/// # Example
///
/// ```rust,ignore
/// let lut = Lattice::identity(33);
/// cube::write_3d("identity.cube", &lut)?;
/// ```
pub fn write_3d<P: AsRef<Path>>(path: P, lattice: &Lattice) -> LutResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_to(&mut writer, lattice)?;
    writer.flush()?;
    Ok(())
}

/// Serializes a lattice as `.cube` text.
pub fn to_cube_string(lattice: &Lattice) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_to(&mut buf, lattice);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_to<W: Write>(writer: &mut W, lattice: &Lattice) -> std::io::Result<()> {
    writeln!(writer, "# Generated by lutlab")?;
    if let Some(title) = lattice.title() {
        writeln!(writer, "TITLE \"{}\"", title)?;
    }
    writeln!(writer, "LUT_3D_SIZE {}", lattice.size())?;
    writeln!(writer)?;
    // Entries are already in file order.
    for rgb in lattice.entries() {
        writeln!(writer, "{:.6} {:.6} {:.6}", rgb[0], rgb[1], rgb[2])?;
    }
    Ok(())
}

// Helper functions

fn parse_size(token: Option<&str>, line_no: usize) -> LutResult<usize> {
    let token =
        token.ok_or_else(|| LutError::Format(format!("line {line_no}: invalid size line")))?;
    let size: usize = token
        .parse()
        .map_err(|_| LutError::Format(format!("line {line_no}: invalid size value {token}")))?;
    if size == 0 {
        return Err(LutError::Format(format!("line {line_no}: size must be > 0")));
    }
    if crate::lattice::cube_len(size).is_none() {
        return Err(LutError::Format(format!(
            "line {line_no}: size {size} is too large"
        )));
    }
    Ok(size)
}

fn parse_floats<'a>(tokens: impl Iterator<Item = &'a str>, line_no: usize) -> LutResult<Vec<f32>> {
    tokens
        .map(|t| {
            t.parse::<f32>()
                .map_err(|_| LutError::Format(format!("line {line_no}: invalid number {t}")))
        })
        .collect()
}

fn parse_rgb(line: &str, line_no: usize) -> LutResult<[f32; 3]> {
    let parts: Vec<&str> = line.split_whitespace().take(3).collect();
    if parts.len() < 3 {
        return Err(LutError::Format(format!(
            "line {line_no}: expected three values, got {line}"
        )));
    }
    let values = parse_floats(parts.into_iter(), line_no)?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(LutError::Format(format!(
            "line {line_no}: non-finite value in {line}"
        )));
    }
    Ok([values[0], values[1], values[2]])
}

fn normalize(rgb: [f32; 3], clamped: &mut usize) -> [f32; 3] {
    rgb.map(|v| {
        if (0.0..=1.0).contains(&v) {
            v
        } else {
            *clamped += 1;
            v.clamp(0.0, 1.0)
        }
    })
}

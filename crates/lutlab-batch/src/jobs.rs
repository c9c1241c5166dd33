//! Batch jobs: applying lattices to images and analyzing LUT files.

use crate::{BatchReport, BatchResult, BatchRunner};
use lutlab_analysis::{LutAnalysis, Thresholds, analyze_with};
use lutlab_lut::{Lattice, apply, cube};
use lutlab_io::png;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// One (image, lattice) pair to transform.
#[derive(Debug, Clone)]
pub struct ApplyJob {
    /// Source PNG.
    pub input: PathBuf,
    /// Lattice to apply.
    pub lattice: Arc<Lattice>,
    /// Destination PNG.
    pub output: PathBuf,
}

/// Applies a lattice to one PNG file and writes the result.
///
/// RGBA inputs keep their alpha plane untouched; the output is written at
/// the input's bit depth.
pub fn apply_file(input: &Path, lattice: &Lattice, output: &Path) -> BatchResult<()> {
    trace!(input = %input.display(), output = %output.display(), "apply_file");
    let decoded = png::read_with_depth(input)?;
    let (rgb, alpha) = decoded.image.split_alpha()?;
    let graded = apply::apply_image(lattice, &rgb)?;
    let out = match alpha {
        Some(a) => graded.with_alpha(&a)?,
        None => graded,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(lutlab_io::IoError::from)?;
    }
    png::write_with_depth(output, &out, decoded.depth)?;
    debug!(output = %output.display(), "image written");
    Ok(())
}

/// Reads, parses and analyzes one `.cube` file.
///
/// The LUT id is the file stem.
pub fn analyze_file(path: &Path, thresholds: &Thresholds) -> BatchResult<LutAnalysis> {
    let parsed = cube::read_3d(path)?;
    let lut_id = lut_id_for(path);
    Ok(analyze_with(lut_id, &parsed.lattice, thresholds))
}

/// LUT id derived from a file path: the file stem, or the whole path if
/// there is none.
pub fn lut_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchRunner {
    /// Applies every job in parallel.
    pub fn apply_batch(&self, jobs: &[ApplyJob]) -> BatchReport<()> {
        self.run(
            jobs,
            |job| job.input.display().to_string(),
            |job| apply_file(&job.input, &job.lattice, &job.output),
        )
    }

    /// Analyzes every LUT file in parallel.
    pub fn analyze_batch(&self, luts: &[PathBuf], thresholds: &Thresholds) -> BatchReport<LutAnalysis> {
        self.run(
            luts,
            |path| path.display().to_string(),
            |path| analyze_file(path, thresholds),
        )
    }
}

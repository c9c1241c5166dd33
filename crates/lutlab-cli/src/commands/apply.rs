//! Single-image LUT application.

use crate::ApplyArgs;
use anyhow::{Context, Result};
use tracing::{info, trace};

/// Grades one PNG; alpha is carried through unchanged.
pub fn run(args: ApplyArgs) -> Result<()> {
    trace!(input = %args.input.display(), lut = %args.lut.display(), "apply::run");
    let parsed = super::load_lut(&args.lut)?;

    lutlab_batch::apply_file(&args.input, &parsed.lattice, &args.output).with_context(|| {
        format!(
            "Failed to apply {} to {}",
            args.lut.display(),
            args.input.display()
        )
    })?;

    info!(output = %args.output.display(), size = parsed.lattice.size(), "LUT applied");
    Ok(())
}

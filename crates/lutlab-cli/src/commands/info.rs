//! LUT info command.
//!
//! Displays lattice size, title, entry count and parser warnings.

use crate::InfoArgs;
use anyhow::Result;
use lutlab_lut::cube::ParsedCube;
use std::path::Path;

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: bool) -> Result<()> {
    for path in &args.input {
        let parsed = super::load_lut(path)?;

        if args.json {
            print_json(path, &parsed)?;
        } else {
            print_text(path, &parsed, verbose);
        }

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, parsed: &ParsedCube, verbose: bool) {
    let lattice = &parsed.lattice;
    println!("{}", path.display());
    println!("  Title:    {}", lattice.title().unwrap_or("-"));
    println!("  Size:     {0}x{0}x{0}", lattice.size());
    println!("  Entries:  {} / {}", lattice.entries().len(), lattice.expected_entries());
    println!("  Complete: {}", if lattice.is_complete() { "yes" } else { "no" });

    if !parsed.warnings.is_empty() {
        println!("  Warnings:");
        for w in &parsed.warnings {
            println!("    {w}");
        }
    }

    if verbose && lattice.is_complete() {
        let n = lattice.size() - 1;
        println!("  Black:    {:?}", lattice.get(0, 0, 0));
        println!("  White:    {:?}", lattice.get(n, n, n));
    }
}

fn print_json(path: &Path, parsed: &ParsedCube) -> Result<()> {
    let lattice = &parsed.lattice;
    let warnings: Vec<String> = parsed.warnings.iter().map(ToString::to_string).collect();
    let value = serde_json::json!({
        "path": path.display().to_string(),
        "title": lattice.title(),
        "size": lattice.size(),
        "entries": lattice.entries().len(),
        "expected_entries": lattice.expected_entries(),
        "complete": lattice.is_complete(),
        "warnings": warnings,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

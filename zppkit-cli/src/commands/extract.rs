use std::path::Path;

use anyhow::{Context, bail};

use zppkit::extract::{batch_extract, extract_to_dir, find_bank_files};

pub fn execute(source: &Path, destination: Option<&Path>) -> anyhow::Result<()> {
    if source.is_dir() {
        execute_batch(source, destination)
    } else {
        execute_single(source, destination)
    }
}

fn execute_single(source: &Path, destination: Option<&Path>) -> anyhow::Result<()> {
    let destination = match destination {
        Some(dest) => dest.to_path_buf(),
        None => default_destination(source)?,
    };

    println!("Extracting {} to {}", source.display(), destination.display());
    let summary = extract_to_dir(source, &destination)
        .with_context(|| format!("failed to extract {}", source.display()))?;

    println!(
        "✓ {} assets, {} unused clips",
        summary.assets_written, summary.unused_written
    );
    if !summary.logic_lines.is_empty() {
        println!("  {} logic lines -> logic.txt", summary.logic_lines.len());
    }
    for warning in &summary.warnings {
        println!("  warning: {warning}");
    }
    Ok(())
}

fn execute_batch(source: &Path, destination: Option<&Path>) -> anyhow::Result<()> {
    let banks = find_bank_files(source);
    if banks.is_empty() {
        bail!("no .zpp files found under {}", source.display());
    }
    let destination = destination.unwrap_or(source);

    println!("Extracting {} banks from {}", banks.len(), source.display());
    let result = batch_extract(&banks, source, destination);

    for line in &result.results {
        println!("  {line}");
    }
    println!("✓ {} extracted, {} failed", result.success_count, result.fail_count);
    if result.fail_count > 0 {
        bail!("{} banks failed to extract", result.fail_count);
    }
    Ok(())
}

/// Sibling folder named after the bank file.
fn default_destination(source: &Path) -> anyhow::Result<std::path::PathBuf> {
    let stem = source
        .file_stem()
        .with_context(|| format!("{} has no file name", source.display()))?;
    Ok(source.with_file_name(stem))
}

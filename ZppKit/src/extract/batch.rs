//! Batch bank extraction
//!
//! Discovery and parallel extraction of whole directory trees of `.zpp`
//! banks, each extracted into a subfolder named after the bank file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use walkdir::WalkDir;

use super::extract_to_dir;

/// Result of a batch extraction run.
#[derive(Debug, Clone)]
pub struct BatchExtractResult {
    /// Number of banks extracted successfully.
    pub success_count: usize,
    /// Number of banks that failed to parse or write.
    pub fail_count: usize,
    /// One message per bank processed.
    pub results: Vec<String>,
}

/// Find all `.zpp` bank files in a directory recursively, sorted.
pub fn find_bank_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut banks: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.path().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("zpp"))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    banks.sort();
    banks
}

/// Extract multiple banks in parallel.
///
/// Each bank lands in a subdirectory of `dest_base` mirroring its path
/// relative to `source_base`, named after the bank file without extension.
/// A failing bank never aborts the run.
pub fn batch_extract(
    bank_files: &[PathBuf],
    source_base: &Path,
    dest_base: &Path,
) -> BatchExtractResult {
    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);

    let results: Vec<String> = bank_files
        .par_iter()
        .map(|bank_path| {
            let relative_path = bank_path
                .strip_prefix(source_base)
                .unwrap_or(bank_path.as_path());
            let display_path = relative_path.to_string_lossy();

            let relative_parent = relative_path.parent().unwrap_or(Path::new(""));
            let bank_stem = bank_path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let bank_dest = dest_base.join(relative_parent).join(&bank_stem);

            match extract_to_dir(bank_path, &bank_dest) {
                Ok(summary) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    format!(
                        "Extracted {display_path}: {} assets, {} unused",
                        summary.assets_written, summary.unused_written
                    )
                }
                Err(e) => {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Failed {display_path}: {e}")
                }
            }
        })
        .collect();

    BatchExtractResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn finds_banks_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.zpp"), b"x").unwrap();
        fs::write(dir.path().join("sub/b.ZPP"), b"x").unwrap();
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let found = find_bank_files(dir.path());
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("a.zpp"));
        assert!(found[1].ends_with("sub/b.ZPP"));
    }

    #[test]
    fn invalid_banks_count_as_failures() {
        let dir = tempfile::tempdir().unwrap();
        let bank = dir.path().join("broken.zpp");
        fs::write(&bank, b"not a bank").unwrap();
        let dest = dir.path().join("out");

        let result = batch_extract(&[bank], dir.path(), &dest);
        assert_eq!(result.success_count, 0);
        assert_eq!(result.fail_count, 1);
        assert!(result.results[0].starts_with("Failed broken.zpp"));
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sanitizer::FileVerdict;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedEntry {
    pub original: PathBuf,
    pub output: PathBuf,
}

/// Outcome counters and per-verdict path lists for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeReport {
    pub root: PathBuf,
    pub scanned: usize,
    pub valid: usize,
    pub converted: usize,
    pub removed: usize,
    pub unidentifiable: usize,
    pub converted_files: Vec<ConvertedEntry>,
    pub removed_files: Vec<PathBuf>,
    pub unidentifiable_files: Vec<PathBuf>,
}

impl SanitizeReport {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            scanned: 0,
            valid: 0,
            converted: 0,
            removed: 0,
            unidentifiable: 0,
            converted_files: Vec::new(),
            removed_files: Vec::new(),
            unidentifiable_files: Vec::new(),
        }
    }

    pub fn record(&mut self, path: &Path, verdict: FileVerdict) {
        self.scanned += 1;
        match verdict {
            FileVerdict::Valid => self.valid += 1,
            FileVerdict::Corrupt => {
                self.removed += 1;
                self.removed_files.push(path.to_path_buf());
            }
            FileVerdict::Converted { output } => {
                self.converted += 1;
                self.converted_files.push(ConvertedEntry {
                    original: path.to_path_buf(),
                    output,
                });
            }
            FileVerdict::Unidentifiable => {
                self.unidentifiable += 1;
                self.unidentifiable_files.push(path.to_path_buf());
            }
        }
    }

    /// True when a run over this tree would change nothing.
    pub fn is_clean(&self) -> bool {
        self.converted == 0 && self.removed == 0
    }
}

pub fn print_summary(report: &SanitizeReport, dry_run: bool) {
    if dry_run {
        println!("=== Check Summary (dry run) ===");
    } else {
        println!("=== Sanitize Summary ===");
    }
    println!("Root: {}", report.root.display());
    println!("  Scanned: {}", report.scanned);
    println!("  Valid: {}", report.valid);
    println!("  Re-encoded: {}", report.converted);
    println!("  Removed: {}", report.removed);
    println!("  Unidentifiable: {}", report.unidentifiable);

    if !report.converted_files.is_empty() {
        println!();
        println!("Re-encoded files:");
        for entry in &report.converted_files {
            println!("  {} -> {}", entry.original.display(), entry.output.display());
        }
    }
    if !report.removed_files.is_empty() {
        println!();
        println!("Removed files:");
        for path in &report.removed_files {
            println!("  {}", path.display());
        }
    }
    if !report.unidentifiable_files.is_empty() {
        println!();
        println!("Unidentifiable files (left in place):");
        for path in &report.unidentifiable_files {
            println!("  {}", path.display());
        }
    }
}

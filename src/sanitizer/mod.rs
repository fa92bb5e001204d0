//! Corruption and format-mismatch sanitizing for image trees.
//!
//! Every regular file under the root goes through a verify pass and, when
//! its extension does not name its actual codec, a re-encode to JPEG. The
//! decoded handle is a scoped value dropped on every exit path.

pub mod formats;

pub use formats::*;

use anyhow::Context;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::SanitizerConfig;
use crate::report::SanitizeReport;

/// Per-file outcome of a sanitize or check pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    /// Decodable and correctly extensioned; left untouched.
    Valid,
    /// Failed the integrity check; deleted (or slated for deletion).
    Corrupt,
    /// Decodable but wrongly extensioned; re-encoded as JPEG at `output`.
    Converted { output: PathBuf },
    /// Not recognizable as an image; reported and left in place.
    Unidentifiable,
}

/// Why a file failed the verify pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The bytes are not recognizable as any supported image format.
    Unidentifiable,
    /// The format was recognized but the stream is truncated or corrupt.
    Corrupt,
}

/// Validate one regular file and normalize it in place.
///
/// Corrupt files are deleted. Files whose extension does not name their
/// detected codec are re-encoded as RGB JPEG at `<basename>.jpeg` and the
/// original is removed. Unrecognizable files are reported and skipped.
/// I/O and permission faults propagate and abort the invocation.
pub fn sanitize_file(path: &Path, config: &SanitizerConfig) -> crate::Result<FileVerdict> {
    // First pass: integrity check.
    let format = match verify_image(path)? {
        Ok(format) => format,
        Err(DecodeFailure::Unidentifiable) => {
            error!("Error: {}", path.display());
            return Ok(FileVerdict::Unidentifiable);
        }
        Err(DecodeFailure::Corrupt) => {
            debug!("corrupt image stream, removing {}", path.display());
            fs::remove_file(path)
                .with_context(|| format!("failed to remove corrupt file {}", path.display()))?;
            return Ok(FileVerdict::Corrupt);
        }
    };

    if extension_matches(path, format) {
        return Ok(FileVerdict::Valid);
    }

    // Second open-and-decode pass. The verify pass already vouched for the
    // stream, so a failure here is a real I/O fault.
    let img = ImageReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to probe {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode {}", path.display()))?;

    let output = jpeg_sibling(path);
    write_jpeg(&img, &output, config.jpeg_quality)?;

    // A mismatched file already named <basename>.jpeg was rewritten in
    // place; deleting it here would destroy the output.
    if output != path {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove original {}", path.display()))?;
    }

    info!(
        "re-encoded {} ({}) as {}",
        path.display(),
        format_name(format),
        output.display()
    );
    Ok(FileVerdict::Converted { output })
}

/// Classify one regular file exactly as [`sanitize_file`] would, without
/// touching the filesystem.
pub fn classify_file(path: &Path) -> crate::Result<FileVerdict> {
    let format = match verify_image(path)? {
        Ok(format) => format,
        Err(DecodeFailure::Unidentifiable) => {
            error!("Error: {}", path.display());
            return Ok(FileVerdict::Unidentifiable);
        }
        Err(DecodeFailure::Corrupt) => return Ok(FileVerdict::Corrupt),
    };

    if extension_matches(path, format) {
        Ok(FileVerdict::Valid)
    } else {
        Ok(FileVerdict::Converted {
            output: jpeg_sibling(path),
        })
    }
}

/// Sanitize every regular file under `root`, depth first.
pub fn sanitize_tree(root: &Path, config: &SanitizerConfig) -> crate::Result<SanitizeReport> {
    walk_tree(root, config, false)
}

/// Dry-run variant of [`sanitize_tree`]: classifies every file and mutates
/// nothing.
pub fn check_tree(root: &Path, config: &SanitizerConfig) -> crate::Result<SanitizeReport> {
    walk_tree(root, config, true)
}

fn walk_tree(root: &Path, config: &SanitizerConfig, dry_run: bool) -> crate::Result<SanitizeReport> {
    let mut report = SanitizeReport::new(root);
    // Iterative traversal with visited-directory tracking, so a symlink
    // cycle cannot loop the walk and nesting depth cannot blow the stack.
    let mut visited = HashSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let canonical = fs::canonicalize(&dir)
            .with_context(|| format!("failed to resolve directory {}", dir.display()))?;
        if !visited.insert(canonical) {
            debug!("already visited {}, skipping", dir.display());
            continue;
        }

        let mut entries = fs::read_dir(&dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("failed to list directory {}", dir.display()))?;
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();
            let mut file_type = entry
                .file_type()
                .with_context(|| format!("failed to stat {}", path.display()))?;

            if file_type.is_symlink() {
                if !config.follow_symlinks {
                    debug!("skipping symlink {}", path.display());
                    continue;
                }
                file_type = match fs::metadata(&path) {
                    Ok(meta) => meta.file_type(),
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        warn!("dangling symlink {}", path.display());
                        continue;
                    }
                    Err(err) => {
                        return Err(err)
                            .with_context(|| format!("failed to stat {}", path.display()));
                    }
                };
            }

            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() {
                let verdict = if dry_run {
                    classify_file(&path)?
                } else {
                    sanitize_file(&path, config)?
                };
                report.record(&path, verdict);
            }
        }
    }

    Ok(report)
}

/// Structural integrity check: detect the true format from content and make
/// sure the stream decodes end to end. Decode problems come back classified;
/// I/O faults propagate.
fn verify_image(path: &Path) -> crate::Result<Result<ImageFormat, DecodeFailure>> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to probe {}", path.display()))?;

    let format = match reader.format() {
        Some(format) => format,
        None => return Ok(Err(DecodeFailure::Unidentifiable)),
    };

    match reader.decode() {
        Ok(_) => Ok(Ok(format)),
        Err(err) => Ok(Err(classify_decode_error(err, path)?)),
    }
}

fn classify_decode_error(err: ImageError, path: &Path) -> crate::Result<DecodeFailure> {
    match err {
        ImageError::Decoding(_) => Ok(DecodeFailure::Corrupt),
        ImageError::Unsupported(_) => Ok(DecodeFailure::Unidentifiable),
        ImageError::IoError(ref io) if io.kind() == ErrorKind::UnexpectedEof => {
            Ok(DecodeFailure::Corrupt)
        }
        other => {
            Err(anyhow::Error::new(other)
                .context(format!("failed to decode {}", path.display())))
        }
    }
}

fn jpeg_sibling(path: &Path) -> PathBuf {
    path.with_extension("jpeg")
}

fn write_jpeg(img: &DynamicImage, output: &Path, quality: u8) -> crate::Result<()> {
    let rgb = img.to_rgb8();
    let file = fs::File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality);
    rgb.write_with_encoder(encoder)
        .with_context(|| format!("failed to encode {}", output.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", output.display()))?;
    Ok(())
}

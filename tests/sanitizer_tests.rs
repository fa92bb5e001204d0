use image::{ImageFormat, Rgb, RgbImage};
use image_sanitizer::*;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn test_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 8 < 4 {
            Rgb([255, 64, 0])
        } else {
            Rgb([0, 128, 255])
        }
    })
}

fn write_image(path: &Path, format: ImageFormat) {
    test_image(32, 32).save_with_format(path, format).unwrap();
}

fn encoded_bytes(format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    test_image(32, 32)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

fn write_truncated(path: &Path, format: ImageFormat) {
    let bytes = encoded_bytes(format);
    fs::write(path, &bytes[..bytes.len() / 2]).unwrap();
}

fn detected_format(path: &Path) -> ImageFormat {
    image::ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .format()
        .unwrap()
}

/// Every regular file under `dir` with its content, in a stable order.
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(d) = stack.pop() {
        for entry in fs::read_dir(&d).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let bytes = fs::read(&path).unwrap();
                files.push((path, bytes));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn valid_png_left_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.png");
    write_image(&path, ImageFormat::Png);
    let before = fs::read(&path).unwrap();

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.valid, 1);
    assert_eq!(report.converted, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn mismatched_extension_reencoded_to_jpeg() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("b.png");
    write_image(&original, ImageFormat::Gif);

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    let output = dir.path().join("b.jpeg");
    assert!(!original.exists());
    assert!(output.exists());
    assert_eq!(detected_format(&output), ImageFormat::Jpeg);
    image::open(&output).unwrap();

    assert_eq!(report.converted, 1);
    assert_eq!(report.converted_files.len(), 1);
    assert_eq!(report.converted_files[0].original, original);
    assert_eq!(report.converted_files[0].output, output);
}

#[test]
fn non_image_reported_and_left_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("c.txt");
    fs::write(&path, b"definitely not an image").unwrap();

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert!(path.exists());
    assert_eq!(fs::read(&path).unwrap(), b"definitely not an image");
    assert_eq!(report.unidentifiable, 1);
    assert_eq!(report.unidentifiable_files, vec![path]);
}

#[test]
fn truncated_png_removed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.png");
    write_truncated(&path, ImageFormat::Png);

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert!(!path.exists());
    assert_eq!(report.removed, 1);
    assert_eq!(report.removed_files, vec![path]);
}

#[test]
fn truncated_jpeg_removed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("d.jpg");
    write_truncated(&path, ImageFormat::Jpeg);

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert!(!path.exists());
    assert_eq!(report.removed, 1);
}

#[test]
fn jpg_shorthand_extension_is_normalized() {
    // Name comparison is strict: "JPG" is not "JPEG", so the file gets
    // rewritten under the canonical extension.
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("e.jpg");
    write_image(&original, ImageFormat::Jpeg);

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert!(!original.exists());
    let output = dir.path().join("e.jpeg");
    assert!(output.exists());
    assert_eq!(detected_format(&output), ImageFormat::Jpeg);
    assert_eq!(report.converted, 1);
}

#[test]
fn mismatch_already_named_jpeg_rewritten_in_place() {
    // PNG bytes under x.jpeg: output path equals the original path, so the
    // rewrite must not be followed by a delete.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("x.jpeg");
    write_image(&path, ImageFormat::Png);

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert!(path.exists());
    assert_eq!(detected_format(&path), ImageFormat::Jpeg);
    assert_eq!(report.converted, 1);
    assert_eq!(report.removed, 0);
}

#[test]
fn second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("a.png"), ImageFormat::Png);
    write_image(&dir.path().join("b.png"), ImageFormat::Gif);
    fs::write(dir.path().join("c.txt"), b"junk bytes").unwrap();
    write_truncated(&dir.path().join("d.jpg"), ImageFormat::Jpeg);

    let config = SanitizerConfig::default();
    sanitize_tree(dir.path(), &config).unwrap();
    let after_first = snapshot(dir.path());

    let second = sanitize_tree(dir.path(), &config).unwrap();
    assert_eq!(second.converted, 0);
    assert_eq!(second.removed, 0);
    assert_eq!(snapshot(dir.path()), after_first);
}

#[test]
fn nested_directories_are_walked() {
    let dir = TempDir::new().unwrap();
    let inner = dir.path().join("sub").join("inner");
    fs::create_dir_all(&inner).unwrap();
    write_image(&dir.path().join("top.png"), ImageFormat::Png);
    write_image(&inner.join("deep.png"), ImageFormat::Gif);

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.valid, 1);
    assert_eq!(report.converted, 1);
    assert!(inner.join("deep.jpeg").exists());
    assert!(!inner.join("deep.png").exists());
}

#[test]
fn check_tree_mutates_nothing_and_matches_run() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("a.png"), ImageFormat::Png);
    write_image(&dir.path().join("b.png"), ImageFormat::Gif);
    fs::write(dir.path().join("c.txt"), b"junk bytes").unwrap();
    write_truncated(&dir.path().join("broken.png"), ImageFormat::Png);

    let config = SanitizerConfig::default();
    let before = snapshot(dir.path());
    let checked = check_tree(dir.path(), &config).unwrap();

    assert_eq!(snapshot(dir.path()), before);
    assert_eq!(checked.scanned, 4);
    assert_eq!(checked.valid, 1);
    assert_eq!(checked.converted, 1);
    assert_eq!(checked.removed, 1);
    assert_eq!(checked.unidentifiable, 1);

    let ran = sanitize_tree(dir.path(), &config).unwrap();
    assert_eq!(ran.valid, checked.valid);
    assert_eq!(ran.converted, checked.converted);
    assert_eq!(ran.removed, checked.removed);
    assert_eq!(ran.unidentifiable, checked.unidentifiable);
}

#[test]
fn classify_file_reports_would_be_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("b.png");
    write_image(&path, ImageFormat::Gif);

    let verdict = classify_file(&path).unwrap();
    assert_eq!(
        verdict,
        FileVerdict::Converted {
            output: dir.path().join("b.jpeg")
        }
    );
    assert!(path.exists());
}

#[cfg(unix)]
#[test]
fn symlink_cycle_terminates() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_image(&dir.path().join("a.png"), ImageFormat::Png);
    symlink(dir.path(), sub.join("back")).unwrap();

    let mut config = SanitizerConfig::default();
    config.follow_symlinks = true;
    let report = sanitize_tree(dir.path(), &config).unwrap();

    // The cycle is cut by visited tracking; each file is seen once.
    assert_eq!(report.scanned, 1);
    assert_eq!(report.valid, 1);
}

#[cfg(unix)]
#[test]
fn symlinks_skipped_by_default() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().unwrap();
    write_image(&outside.path().join("m.png"), ImageFormat::Gif);

    let dir = TempDir::new().unwrap();
    symlink(outside.path(), dir.path().join("linked")).unwrap();

    let config = SanitizerConfig::default();
    let report = sanitize_tree(dir.path(), &config).unwrap();

    assert_eq!(report.scanned, 0);
    assert!(outside.path().join("m.png").exists());
}

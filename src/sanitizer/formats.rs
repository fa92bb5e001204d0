use image::ImageFormat;
use std::path::Path;

/// Canonical uppercase codec name, the form file extensions are compared
/// against.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Ico => "ICO",
        ImageFormat::Pnm => "PNM",
        ImageFormat::Tga => "TGA",
        ImageFormat::Dds => "DDS",
        ImageFormat::Farbfeld => "FARBFELD",
        ImageFormat::Avif => "AVIF",
        ImageFormat::Qoi => "QOI",
        ImageFormat::OpenExr => "EXR",
        ImageFormat::Hdr => "HDR",
        _ => "UNKNOWN",
    }
}

/// True when the uppercased file extension names the detected codec.
///
/// The comparison is on names, so `photo.jpg` does NOT match `JPEG` and
/// gets normalized to `photo.jpeg`. Files without an extension never match.
pub fn extension_matches(path: &Path, format: ImageFormat) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_uppercase();
    ext == format_name(format)
}

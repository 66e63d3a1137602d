/// Local inspection of image bytes
///
/// The compression itself happens remotely; this module only answers the
/// questions the client needs locally: what content type to announce in the
/// upload, and how large an image is in pixels for display.
use crate::constants::FALLBACK_CONTENT_TYPE;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Pick the content type for an upload: extension first, then magic bytes.
pub fn detect_content_type(path: &Path, bytes: &[u8]) -> String {
    ImageFormat::from_path(path)
        .ok()
        .or_else(|| image::guess_format(bytes).ok())
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Read the pixel dimensions from an encoded image header.
///
/// Returns `None` when the bytes are not a recognised image.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

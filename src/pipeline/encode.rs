//! Image encoding: uploaded bytes → base64 PNG wrapped in `ImageData`.
//!
//! Uploads are decoded first, so a file that merely claims to be a PNG fails
//! here with an OCR error instead of an opaque provider 400. Oversized photos
//! are downscaled so the longest edge stays within [`MAX_OCR_EDGE`]; phone
//! cameras routinely produce 4000 px images that cost tokens without making
//! handwriting any more legible.

use crate::error::NotesError;
use crate::pipeline::input::ImageUpload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::{imageops::FilterType, DynamicImage};
use std::io::Cursor;
use tracing::debug;

/// Longest edge, in pixels, sent to the vision model.
pub const MAX_OCR_EDGE: u32 = 2000;

/// Decode an upload, cap its size and re-encode it as base64 PNG.
pub fn encode_upload(upload: &ImageUpload) -> Result<ImageData, NotesError> {
    let img = image::load_from_memory(&upload.bytes).map_err(|e| {
        NotesError::OcrFailed(format!("'{}' is not a readable image: {}", upload.name, e))
    })?;
    encode_image(&cap_dimensions(img))
        .map_err(|e| NotesError::OcrFailed(format!("Image encoding failed: {e}")))
}

/// Encode a decoded image as a base64 PNG ready for the VLM API.
pub fn encode_image(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

fn cap_dimensions(img: DynamicImage) -> DynamicImage {
    if img.width().max(img.height()) <= MAX_OCR_EDGE {
        return img;
    }
    debug!(
        "Downscaling {}x{} image to fit {} px",
        img.width(),
        img.height(),
        MAX_OCR_EDGE
    );
    img.resize(MAX_OCR_EDGE, MAX_OCR_EDGE, FilterType::Triangle)
}

//! Image preparation for upload
//!
//! Uploaded payloads are re-encoded as JPEG before they reach the bucket,
//! whatever format the client sent.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError};
use tracing::debug;

/// MIME type of every stored image
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Decode `data` and re-encode it as JPEG at `quality` (clamped to 1..=100)
pub fn encode_jpeg(data: &[u8], quality: u8) -> Result<Vec<u8>, ImageError> {
    let image = image::load_from_memory(data)?;
    encode_dynamic(&image, quality)
}

fn encode_dynamic(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let quality = quality.clamp(1, 100);
    // JPEG carries no alpha channel
    let rgb = image.to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode_image(&rgb)?;

    debug!(
        width = rgb.width(),
        height = rgb.height(),
        quality,
        bytes = buffer.len(),
        "Encoded JPEG"
    );

    Ok(buffer)
}

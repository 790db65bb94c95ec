//! Transport encoding of illustrations: raster image ⇄ base64 PNG.
//!
//! The image service hands illustrations back as base64 text
//! (`response_format = b64_json`). [`decode_payload`] turns that text back
//! into a `DynamicImage` for the assembler; [`encode_png`] is its inverse
//! and is what stub image services use to fabricate payloads.

use crate::error::PikbookError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as base64 PNG. PNG keeps the round trip lossless.
pub fn encode_png(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(b64)
}

/// Decode a base64 payload for page `page` into a raster image.
///
/// Surrounding whitespace and embedded line breaks are tolerated; the image
/// format is sniffed from the decoded bytes.
pub fn decode_payload(page: usize, payload: &str) -> Result<DynamicImage, PikbookError> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| PikbookError::InvalidPayload {
            page,
            detail: format!("base64: {e}"),
        })?;

    let img = image::load_from_memory(&bytes).map_err(|e| PikbookError::InvalidPayload {
        page,
        detail: format!("image: {e}"),
    })?;

    debug!(
        "Decoded page {} illustration → {}x{} px",
        page,
        img.width(),
        img.height()
    );
    Ok(img)
}

//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! The chat-completions API accepts images as base64 data-URIs embedded in
//! the JSON request body. PNG is chosen over JPEG because it is lossless —
//! the dotted leaders and small page numbers a TOC is made of are exactly
//! the kind of fine structure JPEG artefacts destroy. `detail: "high"`
//! instructs the model to use its full image tile budget; without it small
//! print is lost.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a base64 PNG ready for the request body.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

//! Image encoding for extraction and transport.
//!
//! Two directions:
//!
//! * [`encode_png`] turns a decoded raster (what pdfium hands back for an
//!   image object) into PNG bytes stored on the [`PageImage`]. PNG is
//!   lossless, so re-encoding never degrades what the scoring model sees.
//! * [`to_attachment`] wraps a [`PageImage`] as a base64 payload with its MIME
//!   type, the form multimodal chat APIs accept as an embedded data
//!   reference.

use crate::output::PageImage;
use crate::pipeline::service::ImageAttachment;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a decoded raster as a PNG [`PageImage`].
pub fn encode_png(img: &DynamicImage) -> Result<PageImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(PageImage::new(buf, "png"))
}

/// Base64-encode an image for a multimodal request.
pub fn to_attachment(image: &PageImage) -> ImageAttachment {
    let data_b64 = STANDARD.encode(&image.bytes);
    debug!("Encoded image → {} bytes base64", data_b64.len());
    ImageAttachment {
        mime_type: image.mime_type(),
        data_b64,
    }
}

/// Pixel dimensions of an encoded image, if it can be decoded.
pub fn dimensions(image: &PageImage) -> Option<(u32, u32)> {
    image::load_from_memory(&image.bytes)
        .ok()
        .map(|img| (img.width(), img.height()))
        .filter(|&(w, h)| w > 0 && h > 0)
}

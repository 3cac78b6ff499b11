//! Encoding the cropped bitmap for transport.
//!
//! This module provides:
//! - PNG encoding of the flattened RGB canvas
//! - Data URI wrapping (`data:<mime>;base64,<payload>`), the form the save
//!   endpoint expects in `image_data`

mod png;

pub use png::{encode_png, encode_rgb_png, EncodeError, PNG_SIGNATURE};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbImage;

/// MIME type of the cropped image payload.
pub const PNG_MIME: &str = "image/png";

/// Wrap raw bytes in a base64 data URI.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Encode a bitmap as a `data:image/png;base64,...` string.
pub fn png_data_uri(image: &RgbImage) -> Result<String, EncodeError> {
    let png = encode_rgb_png(image)?;
    Ok(to_data_uri(PNG_MIME, &png))
}

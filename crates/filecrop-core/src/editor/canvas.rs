//! Rendering the crop box to an output bitmap.
//!
//! The crop box is sampled from the source at its own size, flattened over
//! the fill color, then scaled so that it fits the output box while keeping
//! the crop's aspect ratio. The result carries no alpha channel.

use image::{imageops, Rgb, RgbImage, RgbaImage};
use thiserror::Error;

use super::geometry::CropBox;
use super::options::{CanvasOptions, FillColor};

/// Errors that can occur while rendering the cropped canvas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    /// The source image has no pixels
    #[error("Source image is empty")]
    EmptySource,

    /// The crop box is not a finite, non-empty rectangle
    #[error("Invalid crop box")]
    InvalidCrop,

    /// Output box has a zero side
    #[error("Invalid output size: width ({width}) and height ({height}) must be non-zero")]
    InvalidSize { width: u32, height: u32 },
}

/// Render `crop` of `source` according to `options`.
///
/// Parts of the crop box outside the source (possible in free view mode)
/// come out as the fill color.
pub fn render_cropped(
    source: &RgbaImage,
    crop: &CropBox,
    options: &CanvasOptions,
) -> Result<RgbImage, CanvasError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(CanvasError::EmptySource);
    }
    if options.width == 0 || options.height == 0 {
        return Err(CanvasError::InvalidSize {
            width: options.width,
            height: options.height,
        });
    }

    if !(crop.is_finite() && crop.width > 0.0 && crop.height > 0.0) {
        return Err(CanvasError::InvalidCrop);
    }

    // Fast path: a box inside the source is cropped, then scaled
    let inside = crop.x >= 0.0
        && crop.y >= 0.0
        && crop.right().round() <= source.width() as f64
        && crop.bottom().round() <= source.height() as f64;
    if !inside {
        return Ok(render_partial(source, crop, options));
    }

    let rect = crop.to_pixel_rect(source.width(), source.height());
    let region = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
    let flat = flatten(&region, options.fill_color);
    let (out_width, out_height) =
        contain_dimensions(flat.width(), flat.height(), options.width, options.height);

    if flat.width() == out_width && flat.height() == out_height {
        return Ok(flat);
    }
    Ok(imageops::resize(&flat, out_width, out_height, options.filter()))
}

/// Render a box that extends past the source straight at output size.
///
/// Only the overlap with the source is resampled, so the cost depends on
/// the output box and never on how far the crop box reaches.
fn render_partial(source: &RgbaImage, crop: &CropBox, options: &CanvasOptions) -> RgbImage {
    let (out_width, out_height) = contain_dimensions(
        whole_pixels(crop.width),
        whole_pixels(crop.height),
        options.width,
        options.height,
    );
    let scale_x = out_width as f64 / crop.width;
    let scale_y = out_height as f64 / crop.height;
    let mut canvas = RgbaImage::new(out_width, out_height);

    let left = crop.x.max(0.0);
    let top = crop.y.max(0.0);
    let right = crop.right().min(source.width() as f64);
    let bottom = crop.bottom().min(source.height() as f64);

    if right > left && bottom > top {
        let rect = CropBox::new(left, top, right - left, bottom - top)
            .to_pixel_rect(source.width(), source.height());
        let target_width = ((rect.width as f64 * scale_x).round() as u32).min(out_width);
        let target_height = ((rect.height as f64 * scale_y).round() as u32).min(out_height);

        if target_width > 0 && target_height > 0 {
            let part = imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image();
            let part = if (target_width, target_height) == part.dimensions() {
                part
            } else {
                imageops::resize(&part, target_width, target_height, options.filter())
            };
            let offset_x = ((rect.x as f64 - crop.x) * scale_x).round() as i64;
            let offset_y = ((rect.y as f64 - crop.y) * scale_y).round() as i64;
            imageops::overlay(&mut canvas, &part, offset_x, offset_y);
        }
    }

    flatten(&canvas, options.fill_color)
}

/// Round a positive length to a pixel count of at least 1.
fn whole_pixels(length: f64) -> u32 {
    length.round().clamp(1.0, u32::MAX as f64) as u32
}

/// Composite RGBA pixels over an opaque color.
pub fn flatten(image: &RgbaImage, fill: FillColor) -> RgbImage {
    let [fr, fg, fb] = fill.0;
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8, f: u8| ((c as u32 * alpha + f as u32 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r, fr), blend(g, fg), blend(b, fb)])
    })
}

/// Largest size with the ratio of `width x height` that fits `max_width x max_height`.
///
/// Small crops are scaled up until one side touches the box, so the result
/// never exceeds the box on either side.
pub fn contain_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if max_height as f64 * ratio > max_width as f64 {
        // Constrained by width
        let new_height = (max_width as f64 / ratio).round() as u32;
        (max_width, new_height.clamp(1, max_height))
    } else {
        // Constrained by height
        let new_width = (max_height as f64 * ratio).round() as u32;
        (new_width.clamp(1, max_width), max_height)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

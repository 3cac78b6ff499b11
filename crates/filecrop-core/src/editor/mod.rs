//! The crop editor: a movable, resizable crop box over a loaded image.
//!
//! [`CropWidget`] is the seam between the session controller and whatever
//! renders the crop box. In a browser that is the page's cropping widget;
//! [`ImageEditor`] is the pure-Rust implementation used natively. It keeps
//! the decoded source pixels and produces the cropped bitmap itself.
//!
//! # Coordinate System
//!
//! The crop box lives in source image pixels. The display scale computed by
//! [`ImageEditor::relayout`] only maps between image and viewport pixels
//! for the page that draws the overlay.

mod canvas;
mod geometry;
mod options;

pub use canvas::{contain_dimensions, flatten, render_cropped, CanvasError};
pub use geometry::{Bounds, CropBox, Handle, PixelRect, MIN_CROP_SIZE};
pub use options::{CanvasOptions, EditorOptions, FillColor, SmoothingQuality, ViewMode};

use image::{RgbImage, RgbaImage};

use crate::encode::png_data_uri;
use crate::error::CropError;

/// A stateful editor attached to one loaded image.
///
/// A widget is created by [`CropWidget::attach`] once its image has loaded
/// and is torn down by [`CropWidget::destroy`], which consumes it.
pub trait CropWidget: Sized {
    /// What the widget needs from the loaded image to attach.
    type Source;

    /// Attach to a loaded image.
    fn attach(source: Self::Source, options: &EditorOptions) -> Result<Self, CropError>;

    /// Current crop box in source pixels.
    fn crop_box(&self) -> CropBox;

    /// Replace the crop box. Returns false when the box was rejected.
    fn set_crop_box(&mut self, crop_box: CropBox) -> bool;

    /// Put the crop box back where it started.
    fn reset(&mut self);

    /// Render the crop box as a `data:image/png;base64,...` URI.
    fn cropped_data_uri(&self, options: &CanvasOptions) -> Result<String, CropError>;

    /// Release everything the widget holds.
    fn destroy(self);
}

/// Pure-Rust crop editor over decoded RGBA pixels.
#[derive(Debug, Clone)]
pub struct ImageEditor {
    source: RgbaImage,
    options: EditorOptions,
    crop_box: CropBox,
    display_scale: f64,
}

impl ImageEditor {
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Source image dimensions (width, height).
    pub fn image_dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    /// Viewport pixels per image pixel after the last [`relayout`](Self::relayout).
    pub fn display_scale(&self) -> f64 {
        self.display_scale
    }

    fn bounds(&self) -> Bounds {
        Bounds::of_image(self.source.width(), self.source.height())
    }

    fn confinement(&self) -> Option<Bounds> {
        self.options
            .view_mode
            .confines_crop_box()
            .then(|| self.bounds())
    }

    /// Keep a free-mode box within one image size of the image on every side.
    fn within_reach(&self, crop_box: CropBox) -> CropBox {
        if self.options.view_mode.confines_crop_box() {
            return crop_box;
        }
        let Bounds { width, height } = self.bounds();
        let shifted = CropBox::new(crop_box.x + width, crop_box.y + height, crop_box.width, crop_box.height)
            .confine(Bounds::new(3.0 * width, 3.0 * height));
        CropBox::new(shifted.x - width, shifted.y - height, shifted.width, shifted.height)
    }

    /// Render the crop box to an opaque bitmap.
    pub fn cropped_canvas(&self, options: &CanvasOptions) -> Result<RgbImage, CanvasError> {
        render_cropped(&self.source, &self.crop_box, options)
    }

    /// Move the crop box. Returns false when the box is not movable or the
    /// delta is not finite.
    pub fn move_by(&mut self, dx: f64, dy: f64) -> bool {
        if !self.options.crop_box_movable || !(dx.is_finite() && dy.is_finite()) {
            return false;
        }
        let moved = self.crop_box.translate(dx, dy, self.confinement());
        self.crop_box = self.within_reach(moved);
        true
    }

    /// Drag a handle of the crop box. Returns false when the box is not
    /// resizable or the delta is not finite.
    pub fn resize_by(&mut self, handle: Handle, dx: f64, dy: f64) -> bool {
        if !self.options.crop_box_resizable || !(dx.is_finite() && dy.is_finite()) {
            return false;
        }
        let resized = self.crop_box.resize(
            handle,
            dx,
            dy,
            self.confinement(),
            self.options.aspect_ratio,
        );
        self.crop_box = self.within_reach(resized);
        true
    }

    /// Recompute the display scale for a viewport of the given size.
    ///
    /// Returns `None` when the editor is not responsive or the viewport is
    /// empty; the previous scale is kept. The crop box is stored in image
    /// pixels and is unaffected.
    pub fn relayout(&mut self, viewport_width: u32, viewport_height: u32) -> Option<f64> {
        if !self.options.responsive || viewport_width == 0 || viewport_height == 0 {
            return None;
        }
        let (width, height) = self.image_dimensions();
        let sx = viewport_width as f64 / width as f64;
        let sy = viewport_height as f64 / height as f64;
        self.display_scale = match self.options.view_mode {
            ViewMode::FillViewport => sx.max(sy),
            _ => sx.min(sy),
        };
        Some(self.display_scale)
    }
}

impl CropWidget for ImageEditor {
    type Source = RgbaImage;

    fn attach(source: RgbaImage, options: &EditorOptions) -> Result<Self, CropError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(CropError::ImageLoad("image has no pixels".to_string()));
        }
        options.validate()?;

        log::debug!("attaching crop editor to {width}x{height} image");
        Ok(Self {
            source,
            options: options.clone(),
            crop_box: CropBox::auto(width, height, options.auto_crop_area, options.aspect_ratio),
            display_scale: 1.0,
        })
    }

    fn crop_box(&self) -> CropBox {
        self.crop_box
    }

    /// Confined to the image when the view mode requires.
    fn set_crop_box(&mut self, crop_box: CropBox) -> bool {
        if !crop_box.is_finite() {
            return false;
        }
        let crop_box = CropBox::new(
            crop_box.x,
            crop_box.y,
            crop_box.width.max(MIN_CROP_SIZE),
            crop_box.height.max(MIN_CROP_SIZE),
        );
        self.crop_box = match self.confinement() {
            Some(bounds) => crop_box.confine(bounds),
            None => self.within_reach(crop_box),
        };
        true
    }

    fn reset(&mut self) {
        let (width, height) = self.image_dimensions();
        self.crop_box = CropBox::auto(
            width,
            height,
            self.options.auto_crop_area,
            self.options.aspect_ratio,
        );
    }

    fn cropped_data_uri(&self, options: &CanvasOptions) -> Result<String, CropError> {
        let canvas = self.cropped_canvas(options)?;
        Ok(png_data_uri(&canvas)?)
    }

    fn destroy(self) {
        log::debug!(
            "destroying crop editor for {}x{} image",
            self.source.width(),
            self.source.height()
        );
    }
}

//! Crop box geometry.
//!
//! All coordinates are in source image pixels, stored as `f64` so that
//! drags and display scaling do not accumulate rounding error. Rounding to
//! whole pixels happens once, in [`CropBox::to_pixel_rect`].
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of the image
//! - `x`/`y` grow right/down
//! - A box is "confined" when it lies entirely inside [`Bounds`]

use serde::{Deserialize, Serialize};

/// Smallest width or height a crop box can be dragged down to.
pub const MIN_CROP_SIZE: f64 = 1.0;

/// Size of the area a crop box may be confined to (the image canvas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn of_image(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// Drag handle on the crop box, named after the compass direction it sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Self::N,
        Self::S,
        Self::E,
        Self::W,
        Self::NE,
        Self::NW,
        Self::SE,
        Self::SW,
    ];

    /// Parse the lowercase handle names used by DOM drag points (`"ne"`, `"w"`, ...).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "n" => Some(Self::N),
            "s" => Some(Self::S),
            "e" => Some(Self::E),
            "w" => Some(Self::W),
            "ne" => Some(Self::NE),
            "nw" => Some(Self::NW),
            "se" => Some(Self::SE),
            "sw" => Some(Self::SW),
            _ => None,
        }
    }

    pub const fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::NE | Self::NW)
    }

    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::SE | Self::SW)
    }

    pub const fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    pub const fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    const fn moves_horizontally(self) -> bool {
        self.moves_left() || self.moves_right()
    }
}

/// Whole-pixel region inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The user-adjustable crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The initial crop box for a freshly attached editor.
    ///
    /// Starts from the whole image (narrowed to `aspect_ratio` when one is
    /// set), scales each side by `area` and centers the result.
    pub fn auto(image_width: u32, image_height: u32, area: f64, aspect_ratio: Option<f64>) -> Self {
        let bounds = Bounds::of_image(image_width, image_height);
        let mut width = bounds.width;
        let mut height = bounds.height;

        if let Some(ratio) = valid_ratio(aspect_ratio) {
            if height * ratio > width {
                height = width / ratio;
            } else {
                width = height * ratio;
            }
        }

        let area = area.clamp(0.0, 1.0);
        let width = (width * area).max(MIN_CROP_SIZE.min(bounds.width));
        let height = (height * area).max(MIN_CROP_SIZE.min(bounds.height));

        Self::new(
            (bounds.width - width) / 2.0,
            (bounds.height - height) / 2.0,
            width,
            height,
        )
    }

    /// All four fields are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Aspect ratio (width / height) of the box.
    pub fn ratio(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Check whether the box lies entirely inside `bounds`.
    pub fn is_within(&self, bounds: Bounds) -> bool {
        const EPS: f64 = 1e-9;
        self.x >= -EPS
            && self.y >= -EPS
            && self.right() <= bounds.width + EPS
            && self.bottom() <= bounds.height + EPS
    }

    /// Shrink and shift the box until it lies inside `bounds`.
    pub fn confine(self, bounds: Bounds) -> Self {
        let width = self.width.clamp(MIN_CROP_SIZE.min(bounds.width), bounds.width);
        let height = self.height.clamp(MIN_CROP_SIZE.min(bounds.height), bounds.height);
        let x = self.x.clamp(0.0, bounds.width - width);
        let y = self.y.clamp(0.0, bounds.height - height);
        Self::new(x, y, width, height)
    }

    /// Move the box by `(dx, dy)`; with `bounds` it stops at the image edges.
    pub fn translate(self, dx: f64, dy: f64, bounds: Option<Bounds>) -> Self {
        let mut x = self.x + dx;
        let mut y = self.y + dy;
        if let Some(bounds) = bounds {
            x = x.clamp(0.0, (bounds.width - self.width).max(0.0));
            y = y.clamp(0.0, (bounds.height - self.height).max(0.0));
        }
        Self::new(x, y, self.width, self.height)
    }

    /// Drag `handle` by `(dx, dy)`.
    ///
    /// The edges opposite the handle stay put. Sides never shrink below
    /// [`MIN_CROP_SIZE`] and never cross over. With `bounds` the dragged
    /// edges stop at the image edges; with `aspect_ratio` the box keeps
    /// that ratio, anchored at the side opposite the handle.
    pub fn resize(
        self,
        handle: Handle,
        dx: f64,
        dy: f64,
        bounds: Option<Bounds>,
        aspect_ratio: Option<f64>,
    ) -> Self {
        let mut left = self.x;
        let mut top = self.y;
        let mut right = self.right();
        let mut bottom = self.bottom();

        if handle.moves_left() {
            left = (left + dx).min(right - MIN_CROP_SIZE);
        }
        if handle.moves_right() {
            right = (right + dx).max(left + MIN_CROP_SIZE);
        }
        if handle.moves_top() {
            top = (top + dy).min(bottom - MIN_CROP_SIZE);
        }
        if handle.moves_bottom() {
            bottom = (bottom + dy).max(top + MIN_CROP_SIZE);
        }

        if let Some(bounds) = bounds {
            left = left.max(0.0);
            top = top.max(0.0);
            right = right.min(bounds.width);
            bottom = bottom.min(bounds.height);
        }

        let resized = Self::new(left, top, right - left, bottom - top);
        match valid_ratio(aspect_ratio) {
            Some(ratio) => resized.fit_ratio(&self, handle, ratio, bounds),
            None => resized,
        }
    }

    /// Re-impose `ratio` on a box just resized from `original` through `handle`.
    fn fit_ratio(self, original: &Self, handle: Handle, ratio: f64, bounds: Option<Bounds>) -> Self {
        let (mut width, mut height) = if handle.moves_horizontally() {
            (self.width, self.width / ratio)
        } else {
            (self.height * ratio, self.height)
        };

        // Anchor fraction along each axis: 0 keeps the left/top edge,
        // 1 keeps the right/bottom edge, 0.5 keeps the center.
        let (fx, ax) = if handle.moves_left() {
            (1.0, original.right())
        } else if handle.moves_right() {
            (0.0, original.x)
        } else {
            (0.5, original.x + original.width / 2.0)
        };
        let (fy, ay) = if handle.moves_top() {
            (1.0, original.bottom())
        } else if handle.moves_bottom() {
            (0.0, original.y)
        } else {
            (0.5, original.y + original.height / 2.0)
        };

        if let Some(bounds) = bounds {
            let max_width = anchored_room(fx, ax, bounds.width);
            let max_height = anchored_room(fy, ay, bounds.height);
            let scale = 1.0_f64.min(max_width / width).min(max_height / height);
            if scale.is_finite() && scale > 0.0 {
                width *= scale;
                height *= scale;
            }
        }

        Self::new(ax - fx * width, ay - fy * height, width, height)
    }

    /// Round to a whole-pixel region clamped to an image of the given size.
    ///
    /// The region is at least 1x1 so there is always something to sample.
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> PixelRect {
        let px_left = (self.x.max(0.0).round() as u32).min(image_width.saturating_sub(1));
        let px_top = (self.y.max(0.0).round() as u32).min(image_height.saturating_sub(1));
        let px_right = (self.right().max(0.0).round() as u32).min(image_width);
        let px_bottom = (self.bottom().max(0.0).round() as u32).min(image_height);

        PixelRect {
            x: px_left,
            y: px_top,
            width: px_right.saturating_sub(px_left).max(1),
            height: px_bottom.saturating_sub(px_top).max(1),
        }
    }
}

/// Longest extent a box anchored at `pos` (with anchor fraction `f`) can
/// have along an axis of length `limit`.
fn anchored_room(f: f64, pos: f64, limit: f64) -> f64 {
    if f <= 0.0 {
        limit - pos
    } else if f >= 1.0 {
        pos
    } else {
        2.0 * pos.min(limit - pos)
    }
}

fn valid_ratio(aspect_ratio: Option<f64>) -> Option<f64> {
    aspect_ratio.filter(|r| r.is_finite() && *r > 0.0)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

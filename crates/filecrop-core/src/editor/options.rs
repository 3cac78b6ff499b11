//! Editor and cropped-canvas options.
//!
//! Field names serialize in camelCase so a page can pass the same option
//! object it would hand to a browser cropping widget.

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// How strictly the crop box is tied to the image canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ViewMode {
    /// The crop box may extend past the image.
    Free,
    /// The crop box stays inside the image.
    #[default]
    ConfineCropBox,
    /// As `ConfineCropBox`; the image is fitted inside the viewport.
    FitViewport,
    /// As `ConfineCropBox`; the image covers the whole viewport.
    FillViewport,
}

impl ViewMode {
    pub fn confines_crop_box(self) -> bool {
        !matches!(self, ViewMode::Free)
    }
}

impl TryFrom<u8> for ViewMode {
    type Error = CropError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ViewMode::Free),
            1 => Ok(ViewMode::ConfineCropBox),
            2 => Ok(ViewMode::FitViewport),
            3 => Ok(ViewMode::FillViewport),
            other => Err(CropError::InvalidConfig(format!(
                "view mode must be 0-3, got {other}"
            ))),
        }
    }
}

impl From<ViewMode> for u8 {
    fn from(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Free => 0,
            ViewMode::ConfineCropBox => 1,
            ViewMode::FitViewport => 2,
            ViewMode::FillViewport => 3,
        }
    }
}

/// Options applied when an editor attaches to a loaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorOptions {
    /// Fixed width/height ratio; `None` leaves the crop box free-form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    pub view_mode: ViewMode,
    /// Grid lines inside the crop box
    pub guides: bool,
    /// Center marker inside the crop box
    pub center: bool,
    /// Dim the area outside the crop box
    pub highlight: bool,
    /// Checkerboard behind the image
    pub background: bool,
    /// Initial crop box size as a fraction of each image side (0, 1]
    pub auto_crop_area: f64,
    /// Re-layout when the viewport is resized
    pub responsive: bool,
    pub crop_box_resizable: bool,
    pub crop_box_movable: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            aspect_ratio: None,
            view_mode: ViewMode::ConfineCropBox,
            guides: true,
            center: true,
            highlight: true,
            background: true,
            auto_crop_area: 0.8,
            responsive: true,
            crop_box_resizable: true,
            crop_box_movable: true,
        }
    }
}

impl EditorOptions {
    pub fn validate(&self) -> Result<(), CropError> {
        if !(self.auto_crop_area > 0.0 && self.auto_crop_area <= 1.0) {
            return Err(CropError::InvalidConfig(format!(
                "autoCropArea must be in (0, 1], got {}",
                self.auto_crop_area
            )));
        }
        if let Some(ratio) = self.aspect_ratio {
            if !(ratio.is_finite() && ratio > 0.0) {
                return Err(CropError::InvalidConfig(format!(
                    "aspectRatio must be a positive number, got {ratio}"
                )));
            }
        }
        Ok(())
    }
}

/// Resampling quality used when the cropped region is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl SmoothingQuality {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            SmoothingQuality::Low => image::imageops::FilterType::Triangle,
            SmoothingQuality::Medium => image::imageops::FilterType::CatmullRom,
            SmoothingQuality::High => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Opaque color used behind transparent pixels of the cropped canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FillColor(pub [u8; 3]);

impl FillColor {
    pub const WHITE: FillColor = FillColor([255, 255, 255]);

    /// Parse a CSS hex color: `#rgb` or `#rrggbb`.
    pub fn parse(value: &str) -> Result<Self, CropError> {
        let invalid = || CropError::InvalidConfig(format!("fill color must be #rgb or #rrggbb, got {value:?}"));
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, slot) in rgb.iter_mut().enumerate() {
                    let v = channel(&hex[i..i + 1])?;
                    *slot = v * 17;
                }
                Ok(FillColor(rgb))
            }
            6 => Ok(FillColor([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            _ => Err(invalid()),
        }
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl TryFrom<String> for FillColor {
    type Error = CropError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FillColor::parse(&value)
    }
}

impl From<FillColor> for String {
    fn from(color: FillColor) -> Self {
        let [r, g, b] = color.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// Options for rendering the cropped region to a bitmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasOptions {
    /// Output box width; the crop is scaled to fit inside `width x height`
    pub width: u32,
    /// Output box height
    pub height: u32,
    pub fill_color: FillColor,
    pub image_smoothing_enabled: bool,
    pub image_smoothing_quality: SmoothingQuality,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            fill_color: FillColor::WHITE,
            image_smoothing_enabled: true,
            image_smoothing_quality: SmoothingQuality::High,
        }
    }
}

impl CanvasOptions {
    /// Resampling filter for these options; disabled smoothing samples nearest pixels.
    pub fn filter(&self) -> image::imageops::FilterType {
        if self.image_smoothing_enabled {
            self.image_smoothing_quality.to_image_filter()
        } else {
            image::imageops::FilterType::Nearest
        }
    }

    pub fn validate(&self) -> Result<(), CropError> {
        if self.width == 0 || self.height == 0 {
            return Err(CropError::InvalidConfig(format!(
                "canvas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

//! The page-side collaborators a crop session drives.

/// Where the image shown in the dialog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A URL the image element fetches
    Url(String),
    /// Inline `data:` URI
    Embedded(String),
}

impl ImageSource {
    /// The value to assign to the image element's `src`.
    pub fn as_src(&self) -> &str {
        match self {
            ImageSource::Url(src) | ImageSource::Embedded(src) => src,
        }
    }
}

impl From<&str> for ImageSource {
    fn from(src: &str) -> Self {
        ImageSource::from(src.to_string())
    }
}

impl From<String> for ImageSource {
    fn from(src: String) -> Self {
        if src.starts_with("data:") {
            ImageSource::Embedded(src)
        } else {
            ImageSource::Url(src)
        }
    }
}

/// Dialog, notification and navigation primitives of the host page.
///
/// Every method is fire-and-forget: the session never waits on the host.
pub trait CropHost {
    /// Point the dialog's image at `source` and record `image_path` in the page.
    fn present_image(&mut self, source: &ImageSource, image_path: &str);

    fn show_modal(&mut self);

    fn hide_modal(&mut self);

    /// Blocking, operator-visible notification.
    fn alert(&mut self, message: &str);

    /// Reload the presenting page.
    fn reload_page(&mut self);

    /// Technical detail for the diagnostic log.
    fn diagnostic(&mut self, message: &str);
}

//! Session configuration.
//!
//! Every field has a default, so an empty object (or no object at all on
//! the JavaScript side) yields the stock file-manager behavior.

use serde::{Deserialize, Serialize};

use crate::editor::{CanvasOptions, EditorOptions};
use crate::error::CropError;

/// When the dialog closes relative to the save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosePolicy {
    /// Close as soon as the request is handed to the transport.
    #[default]
    Immediate,
    /// Keep the dialog open until the response arrives.
    AfterResponse,
}

/// Operator-facing alert texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Messages {
    pub not_initialized: String,
    pub save_in_flight: String,
    pub encoding_unavailable: String,
    pub load_failed: String,
    pub saved: String,
    /// Followed by the server-supplied error detail
    pub rejected_prefix: String,
    pub transport_failure: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            not_initialized: "Cropper not initialized".to_string(),
            save_in_flight: "The cropped image is still being saved.".to_string(),
            encoding_unavailable: "Could not get cropped image data".to_string(),
            load_failed: "Could not load the image for cropping.".to_string(),
            saved: "Image cropped and saved successfully!".to_string(),
            rejected_prefix: "Error saving cropped image: ".to_string(),
            transport_failure: "Error saving cropped image. See console for details.".to_string(),
        }
    }
}

/// Configuration for a [`CropSession`](crate::session::CropSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CropConfig {
    /// Path the cropped image is POSTed to
    pub endpoint: String,
    /// Reload the page after a successful save
    pub reload_on_success: bool,
    pub close_policy: ClosePolicy,
    pub editor: EditorOptions,
    pub canvas: CanvasOptions,
    pub messages: Messages,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            endpoint: "/crop".to_string(),
            reload_on_success: true,
            close_policy: ClosePolicy::Immediate,
            editor: EditorOptions::default(),
            canvas: CanvasOptions::default(),
            messages: Messages::default(),
        }
    }
}

impl CropConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), CropError> {
        if self.endpoint.trim().is_empty() {
            return Err(CropError::InvalidConfig("endpoint must not be empty".to_string()));
        }
        self.editor.validate()?;
        self.canvas.validate()
    }
}

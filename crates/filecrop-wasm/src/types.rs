//! JavaScript-facing option types.
//!
//! These are converted from plain JS objects with `serde-wasm-bindgen`, so
//! every field is optional on the JavaScript side.

use filecrop_core::CropConfig;
use serde::{Deserialize, Serialize};

/// DOM hooks of the crop dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementIds {
    /// The modal dialog element
    pub modal: String,
    /// The `<img>` the editor attaches to
    pub image: String,
    /// Input that holds the server-side path of the image
    pub image_path: String,
    /// Confirm button that saves the crop
    pub confirm_button: String,
    /// CSS selector matching every control that dismisses the dialog
    pub dismiss_selector: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            modal: "cropModal".to_string(),
            image: "cropImage".to_string(),
            image_path: "imagePath".to_string(),
            confirm_button: "cropButton".to_string(),
            dismiss_selector: "[data-bs-dismiss=\"modal\"]".to_string(),
        }
    }
}

/// Everything `new CropController(options)` accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerOptions {
    #[serde(flatten)]
    pub config: CropConfig,
    pub elements: ElementIds,
    /// Console log level (`"off"` through `"trace"`)
    pub log_level: Option<String>,
}

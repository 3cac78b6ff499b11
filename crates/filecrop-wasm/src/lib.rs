//! Filecrop WASM - WebAssembly bindings for the crop dialog
//!
//! This crate drives the filecrop-core session from a browser page: it
//! shows and hides the Bootstrap modal, attaches the page's Cropper.js
//! widget when the dialog's image has loaded, and POSTs the cropped PNG
//! with `fetch`.
//!
//! # Module Structure
//!
//! - `controller` - The exported `CropController` class
//! - `cropper` - Cropper.js binding implementing the core's `CropWidget`
//! - `dom` - DOM lookups, modal, alerts, reloads
//! - `transport` - `fetch` delivery of the save request
//! - `types` - JavaScript-facing option objects
//! - `logging` - `log` backend writing to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { CropController } from '@filecrop/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const crop = new CropController();
//! crop.bind();
//! crop.openCrop('/files/photos/cat.jpg?raw', 'photos/cat.jpg');
//! ```

use wasm_bindgen::prelude::*;

mod controller;
mod cropper;
mod dom;
mod logging;
mod transport;
mod types;

pub use controller::CropController;
pub use cropper::CropperWidget;
pub use transport::FetchTransport;
pub use types::{ControllerOptions, ElementIds};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::init(log::LevelFilter::Info);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

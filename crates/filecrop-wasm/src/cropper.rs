//! The page's Cropper.js widget behind [`CropWidget`].
//!
//! The crop box, guides and drag handles are drawn and driven by Cropper;
//! the session only creates it, reads it and destroys it. Option objects
//! are the core's [`EditorOptions`] and [`CanvasOptions`], whose camelCase
//! fields are Cropper's own option names.

use filecrop_core::encode::PNG_MIME;
use filecrop_core::{CanvasOptions, CropBox, CropError, CropWidget, EditorOptions};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlImageElement};

use crate::transport::describe;

#[wasm_bindgen]
extern "C" {
    /// `window.Cropper`, loaded by the page.
    #[wasm_bindgen(js_name = Cropper)]
    type JsCropper;

    #[wasm_bindgen(constructor, js_class = "Cropper", catch)]
    fn new(element: &HtmlImageElement, options: &JsValue) -> Result<JsCropper, JsValue>;

    #[wasm_bindgen(method, js_name = getData)]
    fn get_data(this: &JsCropper, rounded: bool) -> JsValue;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &JsCropper, data: &JsValue);

    #[wasm_bindgen(method)]
    fn reset(this: &JsCropper);

    /// `null` until the widget is ready.
    #[wasm_bindgen(method, js_name = getCroppedCanvas, catch)]
    fn get_cropped_canvas(this: &JsCropper, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    fn destroy(this: &JsCropper);
}

/// A Cropper instance attached to the dialog's image element.
pub struct CropperWidget {
    cropper: JsCropper,
}

impl CropWidget for CropperWidget {
    type Source = HtmlImageElement;

    fn attach(image: HtmlImageElement, options: &EditorOptions) -> Result<Self, CropError> {
        options.validate()?;
        let options = to_js(options).map_err(CropError::InvalidConfig)?;
        let cropper = JsCropper::new(&image, &options).map_err(|err| {
            CropError::ImageLoad(format!("cropping widget unavailable: {}", describe(&err)))
        })?;
        log::debug!("cropper attached to {}", image.src());
        Ok(Self { cropper })
    }

    fn crop_box(&self) -> CropBox {
        serde_wasm_bindgen::from_value(self.cropper.get_data(true)).unwrap_or_else(|err| {
            log::warn!("unreadable crop data from cropper: {err}");
            CropBox::new(0.0, 0.0, 0.0, 0.0)
        })
    }

    fn set_crop_box(&mut self, crop_box: CropBox) -> bool {
        if !crop_box.is_finite() {
            return false;
        }
        match to_js(&crop_box) {
            Ok(data) => {
                self.cropper.set_data(&data);
                true
            }
            Err(err) => {
                log::warn!("crop box not passed to cropper: {err}");
                false
            }
        }
    }

    fn reset(&mut self) {
        self.cropper.reset();
    }

    fn cropped_data_uri(&self, options: &CanvasOptions) -> Result<String, CropError> {
        let options = to_js(options).map_err(CropError::EncodingUnavailable)?;
        let canvas: HtmlCanvasElement = self
            .cropper
            .get_cropped_canvas(&options)
            .map_err(|err| CropError::EncodingUnavailable(describe(&err)))?
            .dyn_into()
            .map_err(|_| CropError::EncodingUnavailable("cropper returned no canvas".to_string()))?;
        canvas
            .to_data_url_with_type(PNG_MIME)
            .map_err(|err| CropError::EncodingUnavailable(describe(&err)))
    }

    fn destroy(self) {
        self.cropper.destroy();
        log::debug!("cropper destroyed");
    }
}

/// Plain JS object for a serde value.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

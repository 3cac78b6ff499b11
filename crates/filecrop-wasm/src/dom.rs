//! Browser side of the crop dialog: DOM lookups, the Bootstrap modal,
//! alerts and reloads.

use filecrop_core::{CropHost, ImageSource};
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{console, Document, HtmlElement, HtmlImageElement, HtmlInputElement, Window};

use crate::types::ElementIds;

pub(crate) fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

pub(crate) fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))
}

/// Look up an element by id and cast it.
pub(crate) fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has an unexpected type")))
}

/// The page elements of one crop dialog.
pub struct DomHost {
    window: Window,
    modal: HtmlElement,
    image: HtmlImageElement,
    image_path: HtmlInputElement,
}

impl DomHost {
    pub fn new(ids: &ElementIds) -> Result<Self, JsValue> {
        let window = window()?;
        let document = document()?;
        Ok(Self {
            modal: element_by_id(&document, &ids.modal)?,
            image: element_by_id(&document, &ids.image)?,
            image_path: element_by_id(&document, &ids.image_path)?,
            window,
        })
    }

    pub fn image(&self) -> &HtmlImageElement {
        &self.image
    }

    /// Call `show` or `hide` on the page's Bootstrap modal instance.
    ///
    /// Falls back to toggling the `hidden` attribute when Bootstrap is not
    /// loaded.
    fn toggle_modal(&self, visible: bool) {
        let method = if visible { "show" } else { "hide" };
        if let Err(err) = self.call_bootstrap_modal(method) {
            log::warn!("bootstrap modal unavailable ({err:?}), toggling hidden instead");
            self.modal.set_hidden(!visible);
        }
    }

    fn call_bootstrap_modal(&self, method: &str) -> Result<(), JsValue> {
        let bootstrap = Reflect::get(&self.window, &JsValue::from_str("bootstrap"))?;
        let modal_class = Reflect::get(&bootstrap, &JsValue::from_str("Modal"))?;
        let get_instance: Function =
            Reflect::get(&modal_class, &JsValue::from_str("getOrCreateInstance"))?.dyn_into()?;
        let instance = get_instance.call1(&modal_class, &self.modal)?;
        let action: Function = Reflect::get(&instance, &JsValue::from_str(method))?.dyn_into()?;
        action.call0(&instance)?;
        Ok(())
    }
}

impl CropHost for DomHost {
    fn present_image(&mut self, source: &ImageSource, image_path: &str) {
        self.image.set_src(source.as_src());
        self.image_path.set_value(image_path);
    }

    fn show_modal(&mut self) {
        self.toggle_modal(true);
    }

    fn hide_modal(&mut self) {
        self.toggle_modal(false);
    }

    fn alert(&mut self, message: &str) {
        if let Err(err) = self.window.alert_with_message(message) {
            console::error_2(&JsValue::from_str("alert failed:"), &err);
        }
    }

    fn reload_page(&mut self) {
        if let Err(err) = self.window.location().reload() {
            console::error_2(&JsValue::from_str("reload failed:"), &err);
        }
    }

    fn diagnostic(&mut self, message: &str) {
        console::error_1(&JsValue::from_str(message));
    }
}

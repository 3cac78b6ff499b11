//! The `CropController` class exported to JavaScript.
//!
//! One controller drives one crop dialog. It owns the [`CropSession`] and
//! the image element's load handlers, attaches the page's Cropper once the
//! image has loaded, and spawns the save request on the browser's event
//! loop.
//!
//! # Example
//!
//! ```typescript
//! import init, { CropController } from '@filecrop/wasm';
//!
//! await init();
//! const crop = new CropController({ endpoint: '/crop' });
//! crop.bind();
//!
//! // From the file list
//! crop.openCrop(thumbnail.src, file.path);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use filecrop_core::{save_with, CropBox, CropSession, CropWidget, LoadTicket, SessionPhase};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event};

use crate::cropper::CropperWidget;
use crate::dom::{self, DomHost};
use crate::logging;
use crate::transport::FetchTransport;
use crate::types::{ControllerOptions, ElementIds};

type Session = CropSession<CropperWidget, DomHost>;

struct LoadHandlers {
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

struct Inner {
    session: RefCell<Session>,
    elements: ElementIds,
    load_handlers: RefCell<Option<LoadHandlers>>,
}

/// Crop dialog controller for JavaScript.
#[wasm_bindgen]
pub struct CropController {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl CropController {
    /// Create a controller. `options` may be omitted for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<CropController, JsValue> {
        let options: ControllerOptions = if options.is_undefined() || options.is_null() {
            ControllerOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid crop options: {}", e)))?
        };

        if let Some(level) = options.log_level.as_deref() {
            let level = logging::parse_level(level)
                .ok_or_else(|| JsValue::from_str(&format!("Invalid log level: {level}")))?;
            logging::init(level);
        }

        let host = DomHost::new(&options.elements)?;
        let session = CropSession::new(options.config, host).map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(CropController {
            inner: Rc::new(Inner {
                session: RefCell::new(session),
                elements: options.elements,
                load_handlers: RefCell::new(None),
            }),
        })
    }

    /// Wire the confirm button to `save`, and every dismiss control plus the
    /// modal's `hidden.bs.modal` event to `closeCrop`.
    pub fn bind(&self) -> Result<(), JsValue> {
        let document = dom::document()?;

        // Escape and backdrop clicks close the modal without a dismiss control
        let modal: Element = dom::element_by_id(&document, &self.inner.elements.modal)?;
        let inner = Rc::clone(&self.inner);
        listen(&modal, "hidden.bs.modal", move || {
            // Already borrowed when our own hide() finishes synchronously
            let Ok(mut session) = inner.session.try_borrow_mut() else {
                return;
            };
            if session.phase() != SessionPhase::Closed {
                session.close_crop();
            }
        })?;

        if let Some(button) = document.get_element_by_id(&self.inner.elements.confirm_button) {
            let inner = Rc::clone(&self.inner);
            listen(&button, "click", move || save(Rc::clone(&inner)))?;
        } else {
            log::warn!("no confirm button #{}", self.inner.elements.confirm_button);
        }

        let dismissers = document.query_selector_all(&self.inner.elements.dismiss_selector)?;
        for i in 0..dismissers.length() {
            let Some(node) = dismissers.item(i) else {
                continue;
            };
            let Ok(control) = node.dyn_into::<Element>() else {
                continue;
            };
            let inner = Rc::clone(&self.inner);
            listen(&control, "click", move || inner.session.borrow_mut().close_crop())?;
        }
        Ok(())
    }

    /// Show the dialog for `image_src` and attach the editor once it loads.
    #[wasm_bindgen(js_name = openCrop)]
    pub fn open_crop(&self, image_src: &str, image_path: &str) {
        let ticket = self.inner.session.borrow_mut().open_crop(image_src, image_path);
        install_load_handlers(&self.inner, ticket);
    }

    /// Hide the dialog and destroy the editor.
    #[wasm_bindgen(js_name = closeCrop)]
    pub fn close_crop(&self) {
        self.inner.session.borrow_mut().close_crop();
    }

    /// The cropped image as a PNG data URI, or `undefined` without an editor.
    #[wasm_bindgen(js_name = getCroppedImageData)]
    pub fn get_cropped_image_data(&self) -> Option<String> {
        self.inner.session.borrow().cropped_image_data()
    }

    /// Save the crop to the endpoint. Returns immediately; the outcome is
    /// reported through alerts.
    #[wasm_bindgen(js_name = saveCroppedImage)]
    pub fn save_cropped_image(&self) {
        save(Rc::clone(&self.inner));
    }

    /// Current crop box `{x, y, width, height}` in image pixels, or `undefined`.
    #[wasm_bindgen(js_name = cropBox)]
    pub fn crop_box(&self) -> Result<JsValue, JsValue> {
        match self.inner.session.borrow().editor() {
            Some(editor) => serde_wasm_bindgen::to_value(&editor.crop_box())
                .map_err(|e| JsValue::from_str(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Place the crop box, in image pixels.
    #[wasm_bindgen(js_name = setCropBox)]
    pub fn set_crop_box(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.with_editor(|editor| editor.set_crop_box(CropBox::new(x, y, width, height)))
    }

    /// Put the crop box back at its initial position.
    #[wasm_bindgen(js_name = resetCropBox)]
    pub fn reset_crop_box(&self) -> bool {
        self.with_editor(|editor| {
            editor.reset();
            true
        })
    }

    /// `"closed"`, `"loading"`, `"editing"` or `"saving"`.
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        phase_name(self.inner.session.borrow().phase()).to_string()
    }

    /// Adjust the console log level (`"off"` through `"trace"`).
    #[wasm_bindgen(js_name = setLogLevel)]
    pub fn set_log_level(&self, level: &str) -> Result<(), JsValue> {
        let level = logging::parse_level(level)
            .ok_or_else(|| JsValue::from_str(&format!("Invalid log level: {level}")))?;
        logging::init(level);
        Ok(())
    }
}

impl CropController {
    fn with_editor(&self, f: impl FnOnce(&mut CropperWidget) -> bool) -> bool {
        self.inner.session.borrow_mut().editor_mut().map(f).unwrap_or(false)
    }
}

fn phase_name(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Closed => "closed",
        SessionPhase::Loading => "loading",
        SessionPhase::Editing => "editing",
        SessionPhase::Saving => "saving",
    }
}

/// Point the image element's load/error handlers at `ticket`.
///
/// Assigning `onload`/`onerror` replaces the handlers of earlier opens, so
/// no listeners pile up on the image element.
fn install_load_handlers(inner: &Rc<Inner>, ticket: LoadTicket) {
    let onload = {
        let inner = Rc::clone(inner);
        Closure::<dyn FnMut()>::new(move || {
            let mut session = inner.session.borrow_mut();
            let image = session.host().image().clone();
            if let Err(err) = session.image_loaded(ticket, image) {
                log::error!("cropper failed to attach: {err}");
            }
        })
    };
    let onerror = {
        let inner = Rc::clone(inner);
        Closure::<dyn FnMut()>::new(move || {
            inner
                .session
                .borrow_mut()
                .image_failed(ticket, "the image could not be loaded");
        })
    };

    {
        let session = inner.session.borrow();
        let image = session.host().image();
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    }

    // The element no longer references the previous pair
    *inner.load_handlers.borrow_mut() = Some(LoadHandlers {
        _onload: onload,
        _onerror: onerror,
    });
}

fn save(inner: Rc<Inner>) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = save_with(&inner.session, &FetchTransport).await {
            log::debug!("save finished with error: {err}");
        }
    });
}

fn listen(target: &Element, event: &str, mut handler: impl FnMut() + 'static) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| handler());
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    // Lives as long as the page
    closure.forget();
    Ok(())
}

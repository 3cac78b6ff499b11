//! `fetch`-based delivery of the save request.

use filecrop_core::{SaveTransport, TransportError};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::dom::window;

/// POSTs JSON bodies with `window.fetch`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

impl FetchTransport {
    async fn send(endpoint: &str, body: String) -> Result<String, JsValue> {
        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&JsValue::from_str(&body));

        let request = Request::new_with_str_and_init(endpoint, &init)?;
        request.headers().set("Content-Type", "application/json")?;

        let response: Response = JsFuture::from(window()?.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        let text = JsFuture::from(response.text()?).await?;
        text.as_string()
            .ok_or_else(|| JsValue::from_str("response body is not text"))
    }
}

impl SaveTransport for FetchTransport {
    async fn post(&self, endpoint: &str, body: String) -> Result<String, TransportError> {
        Self::send(endpoint, body)
            .await
            .map_err(|err| TransportError::new(describe(&err)))
    }
}

/// Human-readable text for a thrown JavaScript value.
pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{err:?}")
}
